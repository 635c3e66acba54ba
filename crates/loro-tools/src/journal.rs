//! Saved journal entries, oldest first.

use loro_core::types::JournalEntry;
use loro_storage::{KeyValueStore, StorageBackend};

use crate::error::ToolError;
use crate::doc::{load_for_update, load_list};
use crate::{keys, persist};

pub struct JournalHistory<'a, B> {
    store: &'a mut KeyValueStore<B>,
}

impl<'a, B: StorageBackend> JournalHistory<'a, B> {
    pub fn new(store: &'a mut KeyValueStore<B>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Vec<JournalEntry> {
        load_list(self.store, keys::JOURNAL)
    }

    /// Append an entry written at `created_at` (Unix ms).
    ///
    /// Content is trimmed; blank entries are skipped and return `Ok(None)`.
    pub fn append(
        &mut self,
        content: &str,
        created_at: i64,
    ) -> Result<Option<JournalEntry>, ToolError> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let entry = JournalEntry {
            id: created_at,
            content: content.to_string(),
            created_at,
        };
        let mut entries: Vec<JournalEntry> = load_for_update(self.store, keys::JOURNAL)?;
        entries.push(entry.clone());
        persist(self.store, keys::JOURNAL, &entries)?;
        Ok(Some(entry))
    }

    pub fn clear(&mut self) -> Result<(), ToolError> {
        persist(self.store, keys::JOURNAL, &Vec::<JournalEntry>::new())
    }
}
