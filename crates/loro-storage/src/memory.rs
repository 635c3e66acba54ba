//! In-process storage backend, mainly for tests and ephemeral sessions.

use std::collections::HashMap;

use crate::backend::{entry_size, StorageBackend};
use crate::error::StorageError;

#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
    quota: Option<usize>,
    unavailable: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that rejects writes once the stored bytes would exceed `quota`.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// A backend whose every operation fails, like a browser with storage disabled.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Bytes currently stored (keys + values)
    pub fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| entry_size(k, v)).sum()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable("memory backend disabled".into()));
        }
        Ok(())
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        if let Some(quota) = self.quota {
            let existing = self.entries.get(key).map_or(0, |v| entry_size(key, v));
            let needed = self.used_bytes() - existing + entry_size(key, value);
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.check_available()?;
        Ok(self.entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut backend = MemoryBackend::new();
        backend.set("k", "v").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v"));

        backend.remove("k").unwrap();
        assert!(backend.get("k").unwrap().is_none());
        // Removing again is fine
        backend.remove("k").unwrap();
    }

    #[test]
    fn test_quota_rejects_without_mutation() {
        let mut backend = MemoryBackend::with_quota(10);
        backend.set("a", "1234").unwrap(); // 5 bytes

        let err = backend.set("b", "123456789").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { quota: 10, .. }));
        assert!(backend.get("b").unwrap().is_none());
        assert_eq!(backend.get("a").unwrap().as_deref(), Some("1234"));
    }

    #[test]
    fn test_quota_counts_overwrite_once() {
        let mut backend = MemoryBackend::with_quota(10);
        backend.set("a", "123456789").unwrap(); // 10 bytes, at the cap
        // Overwriting the same key with an equal-size value must still fit
        backend.set("a", "987654321").unwrap();
        assert_eq!(backend.used_bytes(), 10);
    }

    #[test]
    fn test_unavailable_backend_fails_everything() {
        let mut backend = MemoryBackend::unavailable();
        assert!(matches!(backend.get("k"), Err(StorageError::Unavailable(_))));
        assert!(backend.set("k", "v").is_err());
        assert!(backend.keys().is_err());
    }
}
