//! Change notifications for file-backed storage.
//!
//! Other processes writing the same storage file (a second CLI invocation, a
//! sync tool) surface here as per-key change events so long-running readers
//! can refresh. Writers are not coordinated: the last write wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::file::read_snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Removed,
}

/// A key in the watched namespace changed. `key` has the namespace stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub kind: ChangeKind,
}

/// Watch the storage file at `path` and stream changes to keys in `namespace`.
///
/// Must be called from within a Tokio runtime. The watcher stops when
/// `cancel` fires or the receiver is dropped.
pub fn watch_file(
    path: PathBuf,
    namespace: String,
    cancel: CancellationToken,
) -> Result<mpsc::Receiver<StorageChange>, StorageError> {
    use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

    // Atomic writes replace the file, so watch its directory instead.
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let (event_tx, mut event_rx) = mpsc::channel::<notify::Event>(32);
    let (change_tx, change_rx) = mpsc::channel(64);

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = event_tx.blocking_send(event);
            }
        },
        Config::default(),
    )?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    let mut previous = load_or_empty(&path);
    info!(path = %path.display(), %namespace, "watching storage file");

    tokio::spawn(async move {
        // Keep the watcher alive for the lifetime of the task
        let _watcher = watcher;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("storage watcher cancelled");
                    break;
                }
                event = event_rx.recv() => {
                    let Some(event) = event else { break };
                    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)) {
                        continue;
                    }
                    if !event.paths.iter().any(|p| p.file_name() == path.file_name()) {
                        continue;
                    }

                    let current = load_or_empty(&path);
                    for change in diff_snapshots(&previous, &current, &namespace) {
                        if change_tx.send(change).await.is_err() {
                            return;
                        }
                    }
                    previous = current;
                }
            }
        }
    });

    Ok(change_rx)
}

fn load_or_empty(path: &Path) -> BTreeMap<String, String> {
    if !path.exists() {
        return BTreeMap::new();
    }
    read_snapshot(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "unreadable storage snapshot");
        BTreeMap::new()
    })
}

/// Keys in `namespace` whose value differs between two snapshots.
pub fn diff_snapshots(
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
    namespace: &str,
) -> Vec<StorageChange> {
    let mut changes = Vec::new();

    for (key, value) in new {
        let Some(bare) = key.strip_prefix(namespace) else {
            continue;
        };
        if old.get(key) != Some(value) {
            changes.push(StorageChange {
                key: bare.to_string(),
                kind: ChangeKind::Set,
            });
        }
    }

    for key in old.keys() {
        let Some(bare) = key.strip_prefix(namespace) else {
            continue;
        };
        if !new.contains_key(key) {
            changes.push(StorageChange {
                key: bare.to_string(),
                kind: ChangeKind::Removed,
            });
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StorageBackend;
    use crate::file::FileBackend;
    use std::time::Duration;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_diff_detects_set_and_remove() {
        let old = map(&[("loro:a", "1"), ("loro:b", "2")]);
        let new = map(&[("loro:a", "1"), ("loro:c", "3")]);

        let changes = diff_snapshots(&old, &new, "loro:");
        assert_eq!(
            changes,
            vec![
                StorageChange { key: "c".into(), kind: ChangeKind::Set },
                StorageChange { key: "b".into(), kind: ChangeKind::Removed },
            ]
        );
    }

    #[test]
    fn test_diff_detects_overwrite() {
        let old = map(&[("loro:a", "1")]);
        let new = map(&[("loro:a", "2")]);

        let changes = diff_snapshots(&old, &new, "loro:");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Set);
    }

    #[test]
    fn test_diff_ignores_other_namespaces() {
        let old = BTreeMap::new();
        let new = map(&[("other:a", "1")]);
        assert!(diff_snapshots(&old, &new, "loro:").is_empty());
    }

    #[tokio::test]
    async fn test_watch_reports_external_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let cancel = CancellationToken::new();

        let mut rx = watch_file(path.clone(), "loro:".into(), cancel.clone()).unwrap();

        let mut writer = FileBackend::open(&path, None).unwrap();
        writer.set("loro:effect:sessions", "[]").unwrap();

        let change = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("change within timeout")
            .expect("channel open");
        assert_eq!(change.key, "effect:sessions");
        assert_eq!(change.kind, ChangeKind::Set);

        cancel.cancel();
    }
}
