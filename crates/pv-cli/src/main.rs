//! phrasevault: recover legacy-encrypted recovery phrases
//!
//! Commands:
//!   recover <record-id> --identity <hint>  - search for the phrase, backfill escrow
//!   classify <ciphertext>                  - show how a stored ciphertext is read
//!   validate                               - check a phrase on stdin against the oracle
//!   config show                            - display current configuration

mod escrow_key;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use pv_core::config::VaultConfig;
use pv_recovery::{
    classify, Caller, JsonFileStore, OwnerOrPrivileged, RecoveryEngine, RecoveryRequest,
    RecoveryResult, Role,
};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "phrasevault",
    version,
    about = "Recover legacy-encrypted recovery phrases",
    long_about = "phrasevault: search the legacy parameter space for a stored recovery phrase \
                  and re-seal it under the operator escrow key"
)]
struct Cli {
    /// Path to phrasevault.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "PHRASEVAULT_CONFIG",
        default_value = "/etc/phrasevault/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides [log].level
    #[arg(long, env = "PHRASEVAULT_LOG")]
    log: Option<String>,

    /// Log format; overrides [log].format
    #[arg(long, env = "PHRASEVAULT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recover a stored recovery phrase
    ///
    /// Without a password only passwordless compositions are tried; the
    /// result may then be `requires_secret_hint`.
    Recover {
        /// Record identifier in the record store
        record_id: String,
        /// Account identity used when the phrase was stored (e.g. email)
        #[arg(long)]
        identity: String,
        /// Read the account password from the first line of stdin
        #[arg(long, conflicts_with = "ask_secret")]
        secret_stdin: bool,
        /// Prompt for the account password on the terminal
        #[arg(long)]
        ask_secret: bool,
        /// Caller id to authorize against the record owner
        #[arg(long)]
        caller: Option<String>,
        /// Treat the caller as privileged
        #[arg(long, requires = "caller")]
        admin: bool,
        /// Record store JSON file (overrides config)
        #[arg(long, env = "PHRASEVAULT_RECORDS")]
        records: Option<PathBuf>,
    },

    /// Show how a stored ciphertext string is classified
    Classify {
        /// Stored ciphertext, exactly as persisted
        ciphertext: String,
    },

    /// Check whether the phrase on stdin has the shape of a recovery phrase
    Validate,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let (config, found) = load_config(&cli.config).await?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match &cli.log_format {
        Some(format) => format.clone(),
        None if config.log.format.eq_ignore_ascii_case("json") => LogFormat::Json,
        None => LogFormat::Text,
    };
    init_logging(&level, &format);

    if !found {
        tracing::warn!(
            "config file not found: {}  (using defaults)",
            cli.config.display()
        );
    }

    match cli.command {
        Commands::Recover {
            record_id,
            identity,
            secret_stdin,
            ask_secret,
            caller,
            admin,
            records,
        } => {
            let secret = read_secret(secret_stdin, ask_secret)?;
            let caller = caller.map(|id| Caller {
                id,
                role: if admin { Role::Admin } else { Role::User },
            });
            let request = RecoveryRequest {
                record_id,
                identity_hint: identity,
                secret_hint: secret,
            };
            cmd_recover(config, request, caller, records.as_deref()).await
        }
        Commands::Classify { ciphertext } => cmd_classify(&ciphertext),
        Commands::Validate => cmd_validate(),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config, found),
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

async fn load_config(path: &Path) -> Result<(VaultConfig, bool)> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("parsing config: {}", path.display()))?;
        Ok((config, true))
    } else {
        Ok((VaultConfig::default(), false))
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    match s.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_default();
            PathBuf::from(home).join(rest)
        }
        None => path.to_path_buf(),
    }
}

fn make_spinner(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} {spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn read_secret(from_stdin: bool, prompt: bool) -> Result<Option<SecretString>> {
    if from_stdin {
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .context("reading password from stdin")?;
        let line = line.strip_suffix('\n').unwrap_or(&line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        return Ok(Some(SecretString::from(line.to_string())));
    }
    if prompt {
        let entered = rpassword::prompt_password("Account password: ")
            .context("reading password from terminal")?;
        return Ok(Some(SecretString::from(entered)));
    }
    Ok(None)
}

// ── `phrasevault recover` ─────────────────────────────────────────────────────

async fn cmd_recover(
    config: VaultConfig,
    request: RecoveryRequest,
    caller: Option<Caller>,
    records_override: Option<&Path>,
) -> Result<ExitCode> {
    let escrow = escrow_key::find_escrow_key(&config.escrow).await?;
    info!(source = %escrow.source, "escrow key loaded");

    let records_path = records_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| expand_tilde(&config.store.records_path));
    let store = JsonFileStore::open(&records_path)
        .with_context(|| format!("opening record store: {}", records_path.display()))?;

    let engine = RecoveryEngine::new(store, escrow.key, config.search.clone());
    let cancel = CancellationToken::new();

    let pb = make_spinner("recover");
    pb.set_message(format!("searching {}", request.record_id));

    let search_cancel = cancel.clone();
    let task = tokio::task::spawn_blocking(move || match caller {
        Some(caller) => engine.recover_as(&OwnerOrPrivileged, &caller, request, &search_cancel),
        None => engine.recover_with_cancel(request, &search_cancel),
    });

    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, stopping search");
                cancel.cancel();
            }
        })
    };

    let joined = task.await;
    watcher.abort();
    pb.finish_and_clear();

    let result = joined.context("recovery task failed")??;
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("serializing result")?
    );

    Ok(match result {
        RecoveryResult::NotFound => ExitCode::from(2),
        _ => ExitCode::SUCCESS,
    })
}

// ── `phrasevault classify` ────────────────────────────────────────────────────

fn cmd_classify(ciphertext: &str) -> Result<ExitCode> {
    let format = classify(ciphertext);
    println!(
        "{}",
        serde_json::to_string_pretty(&format).context("serializing format")?
    );
    Ok(ExitCode::SUCCESS)
}

// ── `phrasevault validate` ────────────────────────────────────────────────────

fn cmd_validate() -> Result<ExitCode> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("reading phrase from stdin")?;

    let verdict = pv_recovery::oracle::validate_phrase_str(&input);
    let words = verdict.as_deref().map(|p| p.split(' ').count()).unwrap_or(0);
    println!(
        "{}",
        serde_json::json!({ "valid": verdict.is_some(), "words": words })
    );

    Ok(if verdict.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// ── `phrasevault config show` ─────────────────────────────────────────────────

fn cmd_config_show(config: &VaultConfig, config_path: &Path, found: bool) -> Result<ExitCode> {
    if found {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_admin_requires_caller() {
        let parsed = Cli::try_parse_from([
            "phrasevault",
            "recover",
            "r1",
            "--identity",
            "a@x.io",
            "--admin",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_secret_sources_conflict() {
        let parsed = Cli::try_parse_from([
            "phrasevault",
            "recover",
            "r1",
            "--identity",
            "a@x.io",
            "--secret-stdin",
            "--ask-secret",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde(Path::new("~/.local/share/phrasevault/records.json"));
        assert!(!expanded.to_string_lossy().starts_with("~/"));
        assert_eq!(expand_tilde(Path::new("/abs")), PathBuf::from("/abs"));
    }

    #[tokio::test]
    async fn test_missing_config_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (config, found) = load_config(&tmp.path().join("absent.toml")).await.unwrap();
        assert!(!found);
        assert_eq!(config.search.max_attempts, 10_000);
    }

    #[tokio::test]
    async fn test_config_file_parsed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("phrasevault.toml");
        std::fs::write(&path, "[search]\nmax_attempts = 42\nparallel = true\n").unwrap();

        let (config, found) = load_config(&path).await.unwrap();
        assert!(found);
        assert_eq!(config.search.max_attempts, 42);
        assert!(config.search.parallel);
    }
}
