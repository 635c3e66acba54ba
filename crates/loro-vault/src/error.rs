use thiserror::Error;

use loro_crypto::CryptoError;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("passphrase must be at least {min} characters")]
    WeakPassphrase { min: usize },

    /// Wrong passphrase, corrupted blob, or unsupported blob format
    #[error("unable to unlock")]
    UnlockFailed,

    #[error("vault is locked")]
    Locked,

    #[error("storage unavailable: encrypted document was not saved")]
    StorageUnavailable,

    #[error("encryption failed: {0}")]
    Seal(String),
}

impl From<CryptoError> for VaultError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::WeakPassphrase { min } => VaultError::WeakPassphrase { min },
            CryptoError::UnsupportedFormat(_) | CryptoError::UnlockFailed => {
                VaultError::UnlockFailed
            }
            CryptoError::Serialize(e) => VaultError::Seal(e.to_string()),
            CryptoError::Encrypt(msg) => VaultError::Seal(msg),
        }
    }
}

impl From<VaultError> for loro_core::LoroError {
    fn from(e: VaultError) -> Self {
        loro_core::LoroError::Vault(e.to_string())
    }
}
