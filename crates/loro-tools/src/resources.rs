//! Saved relaxation resources (links or short notes), newest first.

use loro_storage::{KeyValueStore, StorageBackend};

use crate::doc::{load_for_update, load_list};
use crate::error::ToolError;
use crate::{keys, persist};

/// Resources kept, newest first
pub const MAX_RESOURCES: usize = 50;

pub struct RelaxResources<'a, B> {
    store: &'a mut KeyValueStore<B>,
}

impl<'a, B: StorageBackend> RelaxResources<'a, B> {
    pub fn new(store: &'a mut KeyValueStore<B>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Vec<String> {
        load_list(self.store, keys::RELAX_RESOURCES)
    }

    /// Prepend a trimmed resource. Blank input is skipped (`Ok(None)`).
    pub fn add(&mut self, text: &str) -> Result<Option<String>, ToolError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let mut items: Vec<String> = load_for_update(self.store, keys::RELAX_RESOURCES)?;
        items.insert(0, text.to_string());
        items.truncate(MAX_RESOURCES);
        persist(self.store, keys::RELAX_RESOURCES, &items)?;
        Ok(Some(text.to_string()))
    }

    /// Delete the resource at `index` in [`list`](Self::list) order. Out of
    /// range is a no-op.
    pub fn remove(&mut self, index: usize) -> Result<(), ToolError> {
        let mut items: Vec<String> = load_for_update(self.store, keys::RELAX_RESOURCES)?;
        if index >= items.len() {
            return Ok(());
        }
        items.remove(index);
        persist(self.store, keys::RELAX_RESOURCES, &items)
    }
}
