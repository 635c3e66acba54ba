use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("passphrase must be at least {min} characters")]
    WeakPassphrase { min: usize },

    /// Blob version or KDF identifier this build does not understand
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Wrong passphrase, tampered blob, or plaintext that is not the expected
    /// JSON. Deliberately indistinguishable.
    #[error("unable to unlock")]
    UnlockFailed,

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("encryption failed: {0}")]
    Encrypt(String),
}
