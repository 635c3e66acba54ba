//! Personal crisis contacts.

use loro_core::types::CrisisContact;
use loro_storage::{KeyValueStore, StorageBackend};

use crate::error::ToolError;
use crate::doc::load_list;
use crate::{keys, persist};

pub struct CrisisContacts<'a, B> {
    store: &'a mut KeyValueStore<B>,
}

impl<'a, B: StorageBackend> CrisisContacts<'a, B> {
    pub fn new(store: &'a mut KeyValueStore<B>) -> Self {
        Self { store }
    }

    /// Saved contacts, or a single blank row when none are stored.
    pub fn load(&self) -> Vec<CrisisContact> {
        if !self.store.contains(keys::CRISIS) {
            return vec![CrisisContact::default()];
        }
        load_list(self.store, keys::CRISIS)
    }

    pub fn save(&mut self, contacts: &[CrisisContact]) -> Result<(), ToolError> {
        persist(self.store, keys::CRISIS, contacts)
    }
}
