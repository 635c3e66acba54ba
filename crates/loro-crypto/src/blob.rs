//! Persisted form of an encrypted document.
//!
//! ```json
//! {"v":1,"kdf":"PBKDF2-SHA256","iter":200000,"salt":"<b64>","iv":"<b64>","ct":"<b64>"}
//! ```
//!
//! `salt` is 16 bytes, `iv` 12 bytes, `ct` the AES-GCM ciphertext with its
//! 16-byte tag appended. All three use standard padded base64.

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::kdf::MAX_ITERATIONS;
use crate::{IV_SIZE, SALT_SIZE, TAG_SIZE};

/// The only blob version this crate reads or writes
pub const BLOB_VERSION: u32 = 1;

/// KDF identifier stored in `kdf`
pub const KDF_NAME: &str = "PBKDF2-SHA256";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    pub v: u32,
    pub kdf: String,
    /// PBKDF2 iteration count; `0` when absent from older blobs
    #[serde(default)]
    pub iter: u32,
    pub salt: String,
    pub iv: String,
    pub ct: String,
}

impl EncryptedBlob {
    pub(crate) fn new(iter: u32, salt: &[u8], iv: &[u8], ct: &[u8]) -> Self {
        Self {
            v: BLOB_VERSION,
            kdf: KDF_NAME.to_string(),
            iter,
            salt: B64.encode(salt),
            iv: B64.encode(iv),
            ct: B64.encode(ct),
        }
    }

    /// Parse a stored blob. Only structural validity is checked here;
    /// version and KDF are checked on decrypt.
    pub fn from_json(raw: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(raw)
            .map_err(|e| CryptoError::UnsupportedFormat(format!("not an encrypted blob: {e}")))
    }

    pub fn to_json(&self) -> Result<String, CryptoError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reject blobs written by an unknown version or KDF, or whose iteration
    /// count is too large to derive in reasonable time.
    pub fn check_format(&self) -> Result<(), CryptoError> {
        if self.v != BLOB_VERSION {
            return Err(CryptoError::UnsupportedFormat(format!(
                "blob version {} (expected {BLOB_VERSION})",
                self.v
            )));
        }
        if self.kdf != KDF_NAME {
            return Err(CryptoError::UnsupportedFormat(format!(
                "kdf '{}' (expected '{KDF_NAME}')",
                self.kdf
            )));
        }
        if self.iter > MAX_ITERATIONS {
            return Err(CryptoError::UnsupportedFormat(format!(
                "iteration count {} exceeds {MAX_ITERATIONS}",
                self.iter
            )));
        }
        Ok(())
    }

    /// Decode `salt`, `iv` and `ct`, checking their lengths.
    pub(crate) fn decode_parts(
        &self,
    ) -> Result<([u8; SALT_SIZE], [u8; IV_SIZE], Vec<u8>), CryptoError> {
        let salt: [u8; SALT_SIZE] = B64
            .decode(&self.salt)
            .ok()
            .and_then(|b| b.try_into().ok())
            .ok_or(CryptoError::UnlockFailed)?;
        let iv: [u8; IV_SIZE] = B64
            .decode(&self.iv)
            .ok()
            .and_then(|b| b.try_into().ok())
            .ok_or(CryptoError::UnlockFailed)?;
        let ct = B64.decode(&self.ct).map_err(|_| CryptoError::UnlockFailed)?;
        if ct.len() < TAG_SIZE {
            return Err(CryptoError::UnlockFailed);
        }
        Ok((salt, iv, ct))
    }
}
