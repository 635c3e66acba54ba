use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use loro_core::config::VaultConfig;
use loro_core::types::SafetyPlan;
use loro_crypto::{decrypt_json, encrypt_json_with, EncryptedBlob, KdfParams, MIN_PASSPHRASE_LEN};
use loro_storage::{KeyValueStore, StorageBackend};

use crate::error::VaultError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    Locked,
    Unlocked,
}

/// The vault used by the safety plan tool.
pub type SafetyPlanVault<B> = EncryptedVault<SafetyPlan, B>;

struct Session<T> {
    document: T,
    passphrase: SecretString,
}

/// One encrypted JSON document of type `T`, persisted under a single store key.
pub struct EncryptedVault<T, B> {
    store: KeyValueStore<B>,
    key: String,
    params: KdfParams,
    min_passphrase_len: usize,
    session: Option<Session<T>>,
}

impl<T, B> EncryptedVault<T, B>
where
    T: Serialize + DeserializeOwned + Default,
    B: StorageBackend,
{
    pub fn new(store: KeyValueStore<B>) -> Self {
        Self::with_config(store, &VaultConfig::default())
    }

    pub fn with_config(store: KeyValueStore<B>, config: &VaultConfig) -> Self {
        Self {
            store,
            key: config.key.clone(),
            params: KdfParams::with_iterations(config.iterations),
            min_passphrase_len: config.min_passphrase_len.max(MIN_PASSPHRASE_LEN),
            session: None,
        }
    }

    pub fn state(&self) -> VaultState {
        if self.session.is_some() {
            VaultState::Unlocked
        } else {
            VaultState::Locked
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.session.is_some()
    }

    /// Whether an encrypted document is persisted, readable or not.
    pub fn has_blob(&self) -> bool {
        self.store
            .load_raw(&self.key)
            .is_some_and(|raw| !raw.is_empty())
    }

    pub fn document(&self) -> Option<&T> {
        self.session.as_ref().map(|s| &s.document)
    }

    pub fn document_mut(&mut self) -> Option<&mut T> {
        self.session.as_mut().map(|s| &mut s.document)
    }

    pub fn store(&self) -> &KeyValueStore<B> {
        &self.store
    }

    /// Open the vault.
    ///
    /// With no stored blob this starts a new, default document and accepts
    /// any passphrase; strength is checked on save. Otherwise the blob must
    /// decrypt under `passphrase`. On failure the vault is Locked with no
    /// document in memory, whatever its previous state.
    pub fn unlock(&mut self, passphrase: SecretString) -> Result<&T, VaultError> {
        self.session = None;

        let document = match self.store.load_raw(&self.key).filter(|raw| !raw.is_empty()) {
            None => {
                info!(key = %self.key, "no vault blob, starting new document");
                T::default()
            }
            Some(raw) => match open_blob(&raw, &passphrase) {
                Ok(document) => {
                    info!(key = %self.key, "vault unlocked");
                    document
                }
                Err(e) => {
                    warn!(key = %self.key, error = %e, "vault unlock failed");
                    return Err(VaultError::UnlockFailed);
                }
            },
        };

        let session = self.session.insert(Session {
            document,
            passphrase,
        });
        Ok(&session.document)
    }

    /// Drop the in-memory document and passphrase. The blob is untouched.
    pub fn lock(&mut self) {
        if self.session.take().is_some() {
            info!(key = %self.key, "vault locked");
        }
    }

    /// Encrypt `document` under `passphrase` and persist it.
    ///
    /// On success the vault stays Unlocked holding `document`, and
    /// `passphrase` becomes the session passphrase. A weak passphrase fails
    /// before any key derivation or storage write.
    pub fn save_encrypted(
        &mut self,
        document: T,
        passphrase: SecretString,
    ) -> Result<(), VaultError> {
        if self.session.is_none() {
            return Err(VaultError::Locked);
        }
        let raw = self.seal(&document, &passphrase)?;
        self.write_blob(&raw)?;
        self.session = Some(Session {
            document,
            passphrase,
        });
        Ok(())
    }

    /// Re-encrypt the in-memory document under the session passphrase.
    pub fn save(&mut self) -> Result<(), VaultError> {
        let session = self.session.as_ref().ok_or(VaultError::Locked)?;
        let raw = self.seal(&session.document, &session.passphrase)?;
        self.write_blob(&raw)
    }

    /// Delete the persisted blob and lock. Irreversible.
    pub fn wipe(&mut self) -> Result<(), VaultError> {
        self.session = None;
        if !self.store.remove(&self.key) {
            return Err(VaultError::StorageUnavailable);
        }
        warn!(key = %self.key, "vault wiped");
        Ok(())
    }

    /// Check strength and encrypt, returning the blob's stored form.
    fn seal(&self, document: &T, passphrase: &SecretString) -> Result<String, VaultError> {
        if passphrase.expose_secret().chars().count() < self.min_passphrase_len {
            return Err(VaultError::WeakPassphrase {
                min: self.min_passphrase_len,
            });
        }
        let blob = encrypt_json_with(document, passphrase, &self.params)?;
        Ok(blob.to_json()?)
    }

    fn write_blob(&mut self, raw: &str) -> Result<(), VaultError> {
        if !self.store.save_raw(&self.key, raw) {
            return Err(VaultError::StorageUnavailable);
        }
        info!(key = %self.key, bytes = raw.len(), "vault saved");
        Ok(())
    }
}

/// Parse and decrypt a stored blob.
fn open_blob<T: DeserializeOwned>(raw: &str, passphrase: &SecretString) -> Result<T, VaultError> {
    let blob = EncryptedBlob::from_json(raw)?;
    debug!(iter = blob.iter, "decrypting vault blob");
    Ok(decrypt_json(&blob, passphrase)?)
}
