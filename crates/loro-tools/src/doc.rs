//! Reading stored tool documents.
//!
//! The browser app stores values produced by `Number(x)`, so a NaN reaches
//! storage as `null`. Object members holding `null` are dropped before typed
//! deserialization and each such field takes its default.
//!
//! Plain reads skip entries that still fail to parse. Read-modify-write goes
//! through [`load_for_update`], which never hands back a partial view.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use loro_storage::{KeyValueStore, StorageBackend};

use crate::error::ToolError;

/// Drop `null` object members at every depth. Array elements are kept, as a
/// `null` there can mean "unanswered".
pub(crate) fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

fn parse<T: DeserializeOwned>(mut value: Value) -> Result<T, serde_json::Error> {
    strip_nulls(&mut value);
    serde_json::from_value(value)
}

fn entry<T: DeserializeOwned>(key: &str, value: Value) -> Option<T> {
    match parse(value) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(key, error = %e, "skipping unreadable entry");
            None
        }
    }
}

/// Stored JSON for `key`; `None` when absent, blank, `null` or not JSON.
fn stored_value<B: StorageBackend>(store: &KeyValueStore<B>, key: &str) -> Option<Value> {
    let raw = store.load_raw(key).filter(|raw| !raw.trim().is_empty())?;
    match serde_json::from_str(&raw) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "stored value is not valid JSON");
            None
        }
    }
}

/// Fail-soft read of a list document. Entries that do not parse are skipped.
pub(crate) fn load_list<B, T>(store: &KeyValueStore<B>, key: &str) -> Vec<T>
where
    B: StorageBackend,
    T: DeserializeOwned,
{
    match stored_value(store, key) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| entry(key, item))
            .collect(),
        Some(_) => {
            warn!(key, "stored value is not a list");
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Fail-soft read of a string-keyed map document, skipping bad entries.
pub(crate) fn load_map<B, T>(store: &KeyValueStore<B>, key: &str) -> BTreeMap<String, T>
where
    B: StorageBackend,
    T: DeserializeOwned,
{
    match stored_value(store, key) {
        Some(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(k, v)| entry(key, v).map(|e| (k, e)))
            .collect(),
        Some(_) => {
            warn!(key, "stored value is not an object");
            BTreeMap::new()
        }
        None => BTreeMap::new(),
    }
}

/// Fail-soft read of a single document; `None` when absent or unreadable.
pub(crate) fn load_doc<B, T>(store: &KeyValueStore<B>, key: &str) -> Option<T>
where
    B: StorageBackend,
    T: DeserializeOwned,
{
    stored_value(store, key).and_then(|value| entry(key, value))
}

/// Read a whole document that is about to be modified and written back.
///
/// Nothing stored yields `T::default()`. A document that exists but does not
/// parse, or a store that cannot be read, is [`ToolError::Unreadable`] so the
/// following write cannot replace data that was never seen.
pub(crate) fn load_for_update<B, T>(
    store: &KeyValueStore<B>,
    key: &'static str,
) -> Result<T, ToolError>
where
    B: StorageBackend,
    T: DeserializeOwned + Default,
{
    let raw = match store.try_load_raw(key) {
        Ok(Some(raw)) if !raw.trim().is_empty() => raw,
        Ok(_) => return Ok(T::default()),
        Err(e) => {
            warn!(key, error = %e, "storage read failed, not overwriting");
            return Err(ToolError::Unreadable { key });
        }
    };

    let value: Value = serde_json::from_str(&raw).map_err(|e| refuse(key, &e))?;
    if value.is_null() {
        return Ok(T::default());
    }
    parse(value).map_err(|e| refuse(key, &e))
}

fn refuse(key: &'static str, error: &serde_json::Error) -> ToolError {
    warn!(key, error = %error, "stored document unreadable, not overwriting");
    ToolError::Unreadable { key }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loro_storage::MemoryBackend;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(default)]
    struct Row {
        n: f64,
        label: String,
    }

    impl Default for Row {
        fn default() -> Self {
            Self {
                n: 1.5,
                label: "none".into(),
            }
        }
    }

    fn store_with(raw: &str) -> KeyValueStore<MemoryBackend> {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        store.save_raw("k", raw);
        store
    }

    #[test]
    fn test_strip_nulls_keeps_array_elements() {
        let mut value = json!({"a": null, "b": [null, {"c": null, "d": 1}]});
        strip_nulls(&mut value);
        assert_eq!(value, json!({"b": [null, {"d": 1}]}));
    }

    #[test]
    fn test_null_fields_take_defaults() {
        let store = store_with(r#"[{"n":null,"label":"a"},{"n":2,"label":null}]"#);
        let rows: Vec<Row> = load_list(&store, "k");
        assert_eq!(
            rows,
            [
                Row { n: 1.5, label: "a".into() },
                Row { n: 2.0, label: "none".into() },
            ]
        );
    }

    #[test]
    fn test_list_skips_bad_entries() {
        let store = store_with(r#"[{"n":"high"},{"n":3}]"#);
        let rows: Vec<Row> = load_list(&store, "k");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].n, 3.0);
    }

    #[test]
    fn test_map_skips_bad_entries() {
        let store = store_with(r#"{"a":{"n":4},"b":"oops","c":null}"#);
        let rows: BTreeMap<String, Row> = load_map(&store, "k");
        assert_eq!(rows.keys().collect::<Vec<_>>(), ["a"]);
    }

    #[test]
    fn test_wrong_shape_reads_empty() {
        let store = store_with(r#"{"n":1}"#);
        assert!(load_list::<_, Row>(&store, "k").is_empty());
        let store = store_with("[1]");
        assert!(load_map::<_, Row>(&store, "k").is_empty());
    }

    #[test]
    fn test_update_defaults_when_nothing_stored() {
        let store = KeyValueStore::new(MemoryBackend::new());
        let rows: Vec<Row> = load_for_update(&store, "k").unwrap();
        assert!(rows.is_empty());

        for raw in ["", "  ", "null"] {
            let rows: Vec<Row> = load_for_update(&store_with(raw), "k").unwrap();
            assert!(rows.is_empty(), "raw: {raw:?}");
        }
    }

    #[test]
    fn test_update_tolerates_nulls() {
        let store = store_with(r#"[{"n":null}]"#);
        let rows: Vec<Row> = load_for_update(&store, "k").unwrap();
        assert_eq!(rows, [Row::default()]);
    }

    #[test]
    fn test_update_refuses_unreadable_documents() {
        for raw in ["not json", r#"[{"n":"high"}]"#, r#"{"n":1}"#] {
            let err = load_for_update::<_, Vec<Row>>(&store_with(raw), "k").unwrap_err();
            assert!(matches!(err, ToolError::Unreadable { key: "k" }), "raw: {raw}");
        }

        let store = KeyValueStore::new(MemoryBackend::unavailable());
        assert!(matches!(
            load_for_update::<_, Vec<Row>>(&store, "k"),
            Err(ToolError::Unreadable { .. })
        ));
    }
}
