use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store is absent or refuses access
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded: write needs {needed} bytes, quota is {quota}")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("storage file is corrupt: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl From<StorageError> for loro_core::LoroError {
    fn from(e: StorageError) -> Self {
        loro_core::LoroError::Storage(e.to_string())
    }
}
