//! Seal and open JSON documents under a passphrase.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::blob::EncryptedBlob;
use crate::error::CryptoError;
use crate::kdf::{derive_key, KdfParams, MAX_ITERATIONS};
use crate::{IV_SIZE, MIN_PASSPHRASE_LEN, SALT_SIZE};

/// Encrypt `value` with the default KDF parameters.
pub fn encrypt_json<T: Serialize + ?Sized>(
    value: &T,
    passphrase: &SecretString,
) -> Result<EncryptedBlob, CryptoError> {
    encrypt_json_with(value, passphrase, &KdfParams::default())
}

/// Encrypt `value` as JSON under `passphrase`.
///
/// Fails with [`CryptoError::WeakPassphrase`] before any key derivation when
/// the passphrase is shorter than [`MIN_PASSPHRASE_LEN`] characters.
pub fn encrypt_json_with<T: Serialize + ?Sized>(
    value: &T,
    passphrase: &SecretString,
    params: &KdfParams,
) -> Result<EncryptedBlob, CryptoError> {
    if passphrase.expose_secret().chars().count() < MIN_PASSPHRASE_LEN {
        return Err(CryptoError::WeakPassphrase {
            min: MIN_PASSPHRASE_LEN,
        });
    }

    if params.iterations > MAX_ITERATIONS {
        return Err(CryptoError::Encrypt(format!(
            "iteration count {} exceeds {MAX_ITERATIONS}",
            params.iterations
        )));
    }

    let plaintext = serde_json::to_vec(value)?;

    let mut rng = rand::rngs::OsRng;
    let mut salt = [0u8; SALT_SIZE];
    rng.fill_bytes(&mut salt);
    let mut iv = [0u8; IV_SIZE];
    rng.fill_bytes(&mut iv);

    let key = derive_key(passphrase, &salt, params);
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Encrypt(format!("creating AES-256-GCM cipher: {e}")))?;

    let ct = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_ref())
        .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

    debug!(
        iterations = params.iterations,
        plaintext_len = plaintext.len(),
        "sealed document"
    );

    Ok(EncryptedBlob::new(params.iterations, &salt, &iv, &ct))
}

/// Decrypt `blob` and parse the plaintext as `T`.
///
/// Returns [`CryptoError::UnsupportedFormat`] for an unknown version or KDF;
/// every other failure (wrong passphrase, tampering, bad encoding, plaintext
/// that is not a `T`) is [`CryptoError::UnlockFailed`].
pub fn decrypt_json<T: DeserializeOwned>(
    blob: &EncryptedBlob,
    passphrase: &SecretString,
) -> Result<T, CryptoError> {
    blob.check_format()?;
    let (salt, iv, ct) = blob.decode_parts()?;

    let key = derive_key(passphrase, &salt, &KdfParams::with_iterations(blob.iter));
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::UnlockFailed)?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&iv), ct.as_ref())
        .map_err(|_| CryptoError::UnlockFailed)?;

    serde_json::from_slice(&plaintext).map_err(|_| CryptoError::UnlockFailed)
}
