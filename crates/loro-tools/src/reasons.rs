//! "Reasons for living" cards.

use uuid::Uuid;

use loro_core::types::Reason;
use loro_storage::{KeyValueStore, StorageBackend};

use crate::error::ToolError;
use crate::doc::{load_for_update, load_list};
use crate::{keys, persist};

pub struct ReasonsList<'a, B> {
    store: &'a mut KeyValueStore<B>,
}

impl<'a, B: StorageBackend> ReasonsList<'a, B> {
    pub fn new(store: &'a mut KeyValueStore<B>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Vec<Reason> {
        load_list(self.store, keys::REASONS)
    }

    /// Prepend a card. Skipped (`Ok(None)`) when text and image are both blank.
    pub fn add(&mut self, text: &str, image_url: &str, ts: i64) -> Result<Option<Reason>, ToolError> {
        let (text, image_url) = (text.trim(), image_url.trim());
        if text.is_empty() && image_url.is_empty() {
            return Ok(None);
        }

        let reason = Reason {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            image_url: image_url.to_string(),
            ts,
        };
        let mut reasons: Vec<Reason> = load_for_update(self.store, keys::REASONS)?;
        reasons.insert(0, reason.clone());
        persist(self.store, keys::REASONS, &reasons)?;
        Ok(Some(reason))
    }

    pub fn remove(&mut self, id: &str) -> Result<(), ToolError> {
        let mut reasons: Vec<Reason> = load_for_update(self.store, keys::REASONS)?;
        reasons.retain(|r| r.id != id);
        persist(self.store, keys::REASONS, &reasons)
    }
}
