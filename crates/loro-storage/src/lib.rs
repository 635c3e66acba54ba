//! loro-storage: namespaced JSON key-value store over local storage backends
//!
//! Layers:
//! ```text
//! KeyValueStore   namespace prefix + JSON (de)serialization, fail-soft
//!   └── StorageBackend   raw string get/set/remove (memory, file, ...)
//! ```
//!
//! The store never surfaces backend errors to callers: `load` returns the
//! caller's fallback and `save` returns `false`.

pub mod backend;
pub mod error;
pub mod file;
pub mod memory;
pub mod store;
pub mod watch;

pub use backend::{open_backend, StorageBackend};
pub use error::StorageError;
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use store::{KeyValueStore, DEFAULT_NAMESPACE};
pub use watch::{watch_file, ChangeKind, StorageChange};
