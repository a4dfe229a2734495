use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::types::HashAlgorithm;

/// Top-level configuration (loaded from phrasevault.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub search: SearchConfig,
    pub escrow: EscrowConfig,
    pub store: StoreConfig,
    pub log: LogConfig,
}

/// Bounds and candidate lists for the recovery search.
///
/// "Full" lists are used when the caller supplies a password hint,
/// "quick" lists when it does not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Wall-clock budget per request in milliseconds (default: 5000)
    pub max_duration_ms: u64,
    /// Maximum number of decrypt attempts per request (default: 10000)
    pub max_attempts: u64,
    /// PBKDF2 iteration counts tried with a password hint, in order
    pub full_iterations: Vec<u32>,
    /// PBKDF2 iteration counts tried without a password hint, in order
    pub quick_iterations: Vec<u32>,
    /// Hash functions tried with a password hint, in order
    pub full_hashes: Vec<HashAlgorithm>,
    /// Hash functions tried without a password hint, in order
    pub quick_hashes: Vec<HashAlgorithm>,
    /// Number of combined-salt variants kept in quick mode (default: 24)
    pub quick_salt_limit: usize,
    /// Search the candidate space on the rayon pool (default: false)
    pub parallel: bool,
}

impl SearchConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_duration_ms: 5000,
            max_attempts: 10_000,
            full_iterations: vec![200_000, 100_000, 50_000, 20_000, 10_000, 4096, 2048, 1024],
            quick_iterations: vec![10_000, 4096, 1024],
            full_hashes: vec![
                HashAlgorithm::Sha1,
                HashAlgorithm::Sha256,
                HashAlgorithm::Sha512,
            ],
            quick_hashes: vec![HashAlgorithm::Sha256, HashAlgorithm::Sha1],
            quick_salt_limit: 24,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EscrowConfig {
    /// File holding the canonical escrow key (lowest-precedence source)
    pub key_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON record store path
    pub records_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            records_path: PathBuf::from("~/.local/share/phrasevault/records.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[search]
max_duration_ms = 1500
max_attempts = 250
full_iterations = [4096, 1024]
quick_iterations = [1024]
full_hashes = ["sha512", "sha1"]
quick_hashes = ["sha256"]
quick_salt_limit = 12
parallel = true

[escrow]
key_file = "/run/secrets/escrow-key"

[store]
records_path = "/var/lib/phrasevault/records.json"

[log]
level = "debug"
format = "json"
"#;
        let config: VaultConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.search.max_duration(), Duration::from_millis(1500));
        assert_eq!(config.search.max_attempts, 250);
        assert_eq!(config.search.full_iterations, vec![4096, 1024]);
        assert_eq!(
            config.search.full_hashes,
            vec![HashAlgorithm::Sha512, HashAlgorithm::Sha1]
        );
        assert_eq!(config.search.quick_salt_limit, 12);
        assert!(config.search.parallel);
        assert_eq!(
            config.escrow.key_file,
            Some(PathBuf::from("/run/secrets/escrow-key"))
        );
        assert_eq!(
            config.store.records_path,
            PathBuf::from("/var/lib/phrasevault/records.json")
        );
        assert_eq!(config.log.format, "json");
    }

    #[test]
    fn test_parse_defaults() {
        let config: VaultConfig = toml::from_str("").unwrap();

        assert_eq!(config.search.max_duration_ms, 5000);
        assert_eq!(config.search.max_attempts, 10_000);
        assert_eq!(
            config.search.full_iterations,
            vec![200_000, 100_000, 50_000, 20_000, 10_000, 4096, 2048, 1024]
        );
        assert_eq!(
            config.search.quick_hashes,
            vec![HashAlgorithm::Sha256, HashAlgorithm::Sha1]
        );
        assert_eq!(config.search.quick_salt_limit, 24);
        assert!(!config.search.parallel);
        assert!(config.escrow.key_file.is_none());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_quick_lists_are_shorter() {
        let search = SearchConfig::default();
        assert!(search.quick_iterations.len() < search.full_iterations.len());
        assert!(search.quick_hashes.len() < search.full_hashes.len());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[search]
max_attempts = 42
"#;
        let config: VaultConfig = toml::from_str(toml_str).unwrap();

        // Overridden
        assert_eq!(config.search.max_attempts, 42);
        // Defaults
        assert_eq!(config.search.max_duration_ms, 5000);
        assert_eq!(config.search.quick_salt_limit, 24);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = VaultConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: VaultConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.search.full_iterations, parsed.search.full_iterations);
        assert_eq!(config.store.records_path, parsed.store.records_path);
        assert_eq!(config.log.format, parsed.log.format);
    }
}
