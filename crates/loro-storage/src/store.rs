//! Namespaced JSON key-value store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// Namespace prefixed to every key unless overridden
pub const DEFAULT_NAMESPACE: &str = "loro:";

/// JSON documents over a [`StorageBackend`], isolated under a fixed namespace.
///
/// Callers address documents by bare key (`"mood:entries"`); the namespace
/// is added before the backend sees the key and stripped again by [`keys`].
/// Apart from [`try_load_raw`], no operation returns an error: reads degrade
/// to the caller-supplied fallback and writes report success as a `bool`.
///
/// [`keys`]: KeyValueStore::keys
/// [`try_load_raw`]: KeyValueStore::try_load_raw
pub struct KeyValueStore<B> {
    backend: B,
    namespace: String,
}

impl<B: StorageBackend> KeyValueStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_namespace(backend, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(backend: B, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Load and deserialize `key`, returning `fallback` when the key is
    /// absent, empty, unreadable, or not valid JSON for `T`.
    pub fn load<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let Some(raw) = self.load_raw(key) else {
            return fallback;
        };
        if raw.is_empty() {
            return fallback;
        }
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "stored value is not valid JSON, using fallback");
                fallback
            }
        }
    }

    /// [`load`](Self::load) with `T::default()` as the fallback.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load(key, T::default())
    }

    /// Serialize `value` to JSON and store it under `key`.
    ///
    /// Returns `false` (after logging) if serialization or the write fails;
    /// other keys are never affected by a failed write.
    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(raw) => self.save_raw(key, &raw),
            Err(e) => {
                warn!(key, error = %e, "failed to serialize value");
                false
            }
        }
    }

    /// Raw stored string for `key`, surfacing backend failures.
    ///
    /// For read-modify-write callers that must tell "nothing stored" apart
    /// from "could not read".
    pub fn try_load_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.backend.get(&self.full_key(key))
    }

    /// Raw stored string for `key`, if readable.
    pub fn load_raw(&self, key: &str) -> Option<String> {
        match self.try_load_raw(key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "storage read failed");
                None
            }
        }
    }

    /// Store an already-serialized string under `key`.
    pub fn save_raw(&mut self, key: &str, raw: &str) -> bool {
        let full = self.full_key(key);
        match self.backend.set(&full, raw) {
            Ok(()) => {
                debug!(key, bytes = raw.len(), "saved");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "storage write failed");
                false
            }
        }
    }

    /// Delete `key`. Returns `false` only if the backend refused.
    pub fn remove(&mut self, key: &str) -> bool {
        let full = self.full_key(key);
        match self.backend.remove(&full) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "storage remove failed");
                false
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.load_raw(key).is_some()
    }

    /// Keys in this namespace with the prefix stripped, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match self.backend.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|k| k.strip_prefix(&self.namespace).map(str::to_string))
                .collect(),
            Err(e) => {
                warn!(error = %e, "storage key listing failed");
                Vec::new()
            }
        };
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        speed: u32,
        color: String,
    }

    #[test]
    fn test_save_then_load() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        let prefs = Prefs {
            speed: 90,
            color: "#fff".into(),
        };

        assert!(store.save("bls:prefs", &prefs));
        assert_eq!(store.load("bls:prefs", Prefs::default()), prefs);
    }

    #[test]
    fn test_keys_are_namespaced_in_backend() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        store.save("mood:entries", &Vec::<u32>::new());

        assert!(store.backend().get("loro:mood:entries").unwrap().is_some());
        assert!(store.backend().get("mood:entries").unwrap().is_none());
    }

    #[test]
    fn test_load_missing_returns_fallback() {
        let store = KeyValueStore::new(MemoryBackend::new());
        let fallback = vec![1, 2, 3];
        assert_eq!(store.load("missing-key", fallback.clone()), fallback);
    }

    #[test]
    fn test_load_corrupted_returns_fallback() {
        let mut backend = MemoryBackend::new();
        backend.set("loro:corrupted-key", "{not json").unwrap();
        let store = KeyValueStore::new(backend);

        let fallback = Prefs {
            speed: 60,
            color: "x".into(),
        };
        assert_eq!(
            store.load("corrupted-key", Prefs {
                speed: 60,
                color: "x".into()
            }),
            fallback
        );
    }

    #[test]
    fn test_load_wrong_shape_returns_fallback() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        store.save("entries", &"a string, not a list");
        let loaded: Vec<u32> = store.load("entries", vec![7]);
        assert_eq!(loaded, vec![7]);
    }

    #[test]
    fn test_load_empty_string_returns_fallback() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        store.save_raw("k", "");
        assert_eq!(store.load("k", 42u32), 42);
    }

    #[test]
    fn test_unavailable_backend_degrades() {
        let mut store = KeyValueStore::new(MemoryBackend::unavailable());
        assert!(!store.save("k", &1u32));
        assert_eq!(store.load("k", 5u32), 5);
        assert!(!store.remove("k"));
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_try_load_raw_surfaces_backend_errors() {
        let store = KeyValueStore::new(MemoryBackend::unavailable());
        assert!(matches!(
            store.try_load_raw("k"),
            Err(StorageError::Unavailable(_))
        ));

        let mut store = KeyValueStore::new(MemoryBackend::new());
        assert_eq!(store.try_load_raw("k").unwrap(), None);
        store.save_raw("k", "1");
        assert_eq!(store.try_load_raw("k").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_quota_failure_isolated_to_failed_key() {
        let mut store = KeyValueStore::new(MemoryBackend::with_quota(64));
        assert!(store.save("small", &"ok"));

        let big = "x".repeat(200);
        assert!(!store.save("big", &big));

        assert_eq!(store.load("small", String::new()), "ok");
        assert!(!store.contains("big"));
    }

    #[test]
    fn test_keys_strip_namespace_and_hide_foreign_keys() {
        let mut backend = MemoryBackend::new();
        backend.set("other-app:token", "\"t\"").unwrap();
        let mut store = KeyValueStore::new(backend);
        store.save("b", &1u32);
        store.save("a", &2u32);

        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_custom_namespace() {
        let mut store = KeyValueStore::with_namespace(MemoryBackend::new(), "test:");
        store.save("k", &true);
        assert!(store.backend().get("test:k").unwrap().is_some());
        assert_eq!(store.namespace(), "test:");
    }

    #[test]
    fn test_remove() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        store.save("k", &1u32);
        assert!(store.remove("k"));
        assert!(!store.contains("k"));
    }

    #[test]
    fn test_borrowed_backend() {
        let mut backend = MemoryBackend::new();
        {
            let mut store = KeyValueStore::new(&mut backend);
            store.save("k", &"v");
        }
        assert_eq!(backend.get("loro:k").unwrap().as_deref(), Some("\"v\""));
    }

    mod proptest_suite {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn save_load_preserves_strings(key in "[a-z:]{1,16}", value in ".*") {
                let mut store = KeyValueStore::new(MemoryBackend::new());
                prop_assert!(store.save(&key, &value));
                prop_assert_eq!(store.load(&key, String::from("fallback")), value);
            }

            #[test]
            fn garbage_never_panics(raw in ".*") {
                let mut backend = MemoryBackend::new();
                backend.set("loro:k", &raw).unwrap();
                let store = KeyValueStore::new(backend);
                let _: Vec<u64> = store.load("k", Vec::new());
            }
        }
    }
}
