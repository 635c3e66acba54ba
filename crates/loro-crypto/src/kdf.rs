//! Key derivation: PBKDF2-HMAC-SHA256 passphrase → AES-256 key

use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::{KEY_SIZE, SALT_SIZE};

/// Iteration count written into new blobs and assumed when a blob omits it
pub const DEFAULT_ITERATIONS: u32 = 200_000;

/// Highest iteration count accepted from a blob or used for sealing
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// A 256-bit key derived from a passphrase via PBKDF2.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// PBKDF2 parameters used when sealing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// HMAC-SHA256 rounds (default: 200000)
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    pub fn with_iterations(iterations: u32) -> Self {
        Self { iterations }
    }
}

/// Derive a 256-bit key from a passphrase and salt using PBKDF2-HMAC-SHA256.
///
/// The passphrase is taken as its UTF-8 bytes, unnormalized. A zero
/// iteration count is treated as [`DEFAULT_ITERATIONS`].
pub fn derive_key(
    passphrase: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> DerivedKey {
    let rounds = if params.iterations == 0 {
        DEFAULT_ITERATIONS
    } else {
        params.iterations
    };

    let mut bytes = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(passphrase.expose_secret().as_bytes(), salt, rounds, &mut bytes);
    DerivedKey { bytes }
}
