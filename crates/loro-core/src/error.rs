use thiserror::Error;

pub type LoroResult<T> = Result<T, LoroError>;

#[derive(Debug, Error)]
pub enum LoroError {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("vault error: {0}")]
    Vault(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
