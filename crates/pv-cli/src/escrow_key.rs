//! Escrow key discovery chain

use anyhow::{Context, Result};
use pv_core::config::EscrowConfig;
use pv_crypto::EscrowKey;
use std::path::{Path, PathBuf};

use crate::expand_tilde;

/// A loaded escrow key and where it came from
pub struct LoadedEscrowKey {
    pub key: EscrowKey,
    pub source: String,
}

/// Discover and load the escrow key using the priority chain:
///   1. $CREDENTIALS_DIRECTORY/escrow-key  (systemd credential injection)
///   2. $PHRASEVAULT_ESCROW_KEY_FILE  (explicit path env var)
///   3. $PHRASEVAULT_ESCROW_KEY  (literal key in env var)
///   4. config escrow.key_file (from phrasevault.toml)
pub async fn find_escrow_key(config: &EscrowConfig) -> Result<LoadedEscrowKey> {
    find_escrow_key_with(config, |name| std::env::var(name).ok()).await
}

async fn find_escrow_key_with(
    config: &EscrowConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<LoadedEscrowKey> {
    // 1. systemd credentials directory
    if let Some(cred_dir) = env("CREDENTIALS_DIRECTORY") {
        let path = PathBuf::from(cred_dir).join("escrow-key");
        if path.exists() {
            return read_key_file(&path, "systemd").await;
        }
    }

    // 2. explicit key file
    if let Some(key_file) = env("PHRASEVAULT_ESCROW_KEY_FILE") {
        let path = PathBuf::from(key_file);
        if path.exists() {
            return read_key_file(&path, "PHRASEVAULT_ESCROW_KEY_FILE").await;
        }
    }

    // 3. literal key
    if let Some(literal) = env("PHRASEVAULT_ESCROW_KEY") {
        if !literal.trim().is_empty() {
            return Ok(LoadedEscrowKey {
                key: EscrowKey::new(&literal)?,
                source: "PHRASEVAULT_ESCROW_KEY (env)".into(),
            });
        }
    }

    // 4. config path
    if let Some(key_file) = &config.key_file {
        let expanded = expand_tilde(key_file);
        if expanded.exists() {
            return read_key_file(&expanded, "config").await;
        }
    }

    anyhow::bail!(
        "no escrow key found. Tried: $CREDENTIALS_DIRECTORY/escrow-key, \
         $PHRASEVAULT_ESCROW_KEY_FILE, $PHRASEVAULT_ESCROW_KEY, and escrow.key_file"
    )
}

async fn read_key_file(path: &Path, origin: &str) -> Result<LoadedEscrowKey> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading escrow key ({origin}): {}", path.display()))?;
    let key = EscrowKey::new(&raw)
        .with_context(|| format!("escrow key file {}", path.display()))?;
    Ok(LoadedEscrowKey {
        key,
        source: format!("{origin}:{}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(vars: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        move |name| map.get(name).cloned()
    }

    #[tokio::test]
    async fn test_systemd_credential_wins() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("escrow-key"), "from-systemd\n").unwrap();
        let env = env_of(&[
            ("CREDENTIALS_DIRECTORY", tmp.path().display().to_string()),
            ("PHRASEVAULT_ESCROW_KEY", "from-env".into()),
        ]);

        let loaded = find_escrow_key_with(&EscrowConfig::default(), env).await.unwrap();
        assert!(loaded.source.starts_with("systemd:"));
    }

    #[tokio::test]
    async fn test_missing_credential_file_falls_through() {
        let tmp = TempDir::new().unwrap();
        let env = env_of(&[
            ("CREDENTIALS_DIRECTORY", tmp.path().display().to_string()),
            ("PHRASEVAULT_ESCROW_KEY", "from-env".into()),
        ]);

        let loaded = find_escrow_key_with(&EscrowConfig::default(), env).await.unwrap();
        assert_eq!(loaded.source, "PHRASEVAULT_ESCROW_KEY (env)");
    }

    #[tokio::test]
    async fn test_config_key_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("escrow.key");
        std::fs::write(&path, "from-config").unwrap();
        let config = EscrowConfig {
            key_file: Some(path),
        };

        let loaded = find_escrow_key_with(&config, env_of(&[])).await.unwrap();
        assert!(loaded.source.starts_with("config:"));
    }

    #[tokio::test]
    async fn test_empty_key_file_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("escrow.key");
        std::fs::write(&path, "  \n").unwrap();
        let env = env_of(&[("PHRASEVAULT_ESCROW_KEY_FILE", path.display().to_string())]);

        let err = find_escrow_key_with(&EscrowConfig::default(), env)
            .await
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("empty"));
    }

    #[tokio::test]
    async fn test_nothing_configured() {
        let result = find_escrow_key_with(&EscrowConfig::default(), env_of(&[])).await;
        assert!(result.is_err());
    }
}
