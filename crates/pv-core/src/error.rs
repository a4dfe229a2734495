use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

/// System faults. Expected recovery outcomes (no match, password needed)
/// are not errors; they are variants of the engine's result type.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AuthorizationDenied(String),

    #[error("record store error: {0}")]
    Store(String),

    #[error("escrow error: {0}")]
    Escrow(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
