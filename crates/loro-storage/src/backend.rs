//! Raw string storage abstraction underneath `KeyValueStore`.

use loro_core::config::{expand_tilde, StorageConfig};

use crate::error::StorageError;
use crate::file::FileBackend;
use crate::memory::MemoryBackend;

/// A string-keyed, string-valued local store.
///
/// Keys reaching a backend are already namespaced; backends never interpret
/// them. Implementations must leave previously stored keys untouched when a
/// write fails.
pub trait StorageBackend {
    /// Look up a raw value. `Ok(None)` means the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or overwrite a raw value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// All keys currently present, in no particular order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for &mut B {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}

/// Build the backend selected by `[storage] backend` in the config.
pub fn open_backend(
    config: &StorageConfig,
) -> Result<Box<dyn StorageBackend + Send>, StorageError> {
    match config.backend.as_str() {
        "file" => {
            let path = expand_tilde(&config.path);
            let backend = FileBackend::open(&path, config.quota_bytes)?;
            tracing::debug!(path = %path.display(), "opened file storage backend");
            Ok(Box::new(backend))
        }
        "memory" => {
            let backend = match config.quota_bytes {
                Some(quota) => MemoryBackend::with_quota(quota),
                None => MemoryBackend::new(),
            };
            Ok(Box::new(backend))
        }
        other => Err(StorageError::Unavailable(format!(
            "unknown storage backend '{other}' (expected \"file\" or \"memory\")"
        ))),
    }
}

/// Bytes a key/value pair occupies for quota accounting.
pub(crate) fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}
