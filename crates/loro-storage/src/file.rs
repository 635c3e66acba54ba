//! File-backed storage: one JSON object mapping namespaced keys to raw strings.
//!
//! The whole file is loaded into memory at open. Every mutation is written
//! through immediately with an atomic write (temp file, then rename), so a
//! crash mid-write leaves the previous contents intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::backend::{entry_size, StorageBackend};
use crate::error::StorageError;

pub struct FileBackend {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl FileBackend {
    /// Open (or lazily create) the storage file at `path`.
    ///
    /// A file that is not a valid JSON string map is moved aside to
    /// `<path>.corrupt` and the backend starts empty.
    pub fn open(path: &Path, quota: Option<usize>) -> Result<Self, StorageError> {
        let entries = if path.exists() {
            match read_snapshot(path) {
                Ok(entries) => entries,
                Err(StorageError::Corrupt(reason)) => {
                    let aside = path.with_extension("corrupt");
                    warn!(
                        path = %path.display(),
                        moved_to = %aside.display(),
                        %reason,
                        "storage file is corrupt, starting empty"
                    );
                    std::fs::rename(path, &aside)?;
                    BTreeMap::new()
                }
                Err(e) => return Err(e),
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = entries.len(), "file backend opened");

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            quota,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file, picking up writes made by other processes.
    pub fn reload(&mut self) -> Result<(), StorageError> {
        self.entries = if self.path.exists() {
            read_snapshot(&self.path)?
        } else {
            BTreeMap::new()
        };
        Ok(())
    }

    fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| entry_size(k, v)).sum()
    }

    /// Persist `next` and adopt it only if the write succeeded.
    fn commit(&mut self, next: BTreeMap<String, String>) -> Result<(), StorageError> {
        write_snapshot(&self.path, &next)?;
        self.entries = next;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let existing = self.entries.get(key).map_or(0, |v| entry_size(key, v));
            let needed = self.used_bytes() - existing + entry_size(key, value);
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.commit(next)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut next = self.entries.clone();
        next.remove(key);
        self.commit(next)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// Parse the storage file into a key → raw value map.
pub(crate) fn read_snapshot(path: &Path) -> Result<BTreeMap<String, String>, StorageError> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&content).map_err(|e| StorageError::Corrupt(e.to_string()))
}

fn write_snapshot(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(entries)
        .map_err(|e| StorageError::Corrupt(format!("serializing storage map: {e}")))?;

    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
