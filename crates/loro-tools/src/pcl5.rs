//! PCL-5 PTSD checklist: autosaved draft and completed assessments.

use loro_core::types::{Pcl5Assessment, Pcl5Draft, PCL5_ITEMS, PCL5_MAX_ITEM};
use loro_storage::{KeyValueStore, StorageBackend};

use crate::error::ToolError;
use crate::doc::{load_doc, load_for_update, load_list};
use crate::{keys, persist};

pub struct Pcl5Tracker<'a, B> {
    store: &'a mut KeyValueStore<B>,
}

impl<'a, B: StorageBackend> Pcl5Tracker<'a, B> {
    pub fn new(store: &'a mut KeyValueStore<B>) -> Self {
        Self { store }
    }

    /// Saved assessments, newest first.
    pub fn assessments(&self) -> Vec<Pcl5Assessment> {
        load_list(self.store, keys::PCL5_ENTRIES)
    }

    /// Score `draft` and save it as an assessment taken at `ts` (Unix ms).
    ///
    /// Every item must be answered with 0–4.
    pub fn save_assessment(
        &mut self,
        draft: &Pcl5Draft,
        ts: i64,
    ) -> Result<Pcl5Assessment, ToolError> {
        let draft = sanitize(draft.clone());
        let responses: Vec<u8> = draft.responses.iter().flatten().copied().collect();
        if responses.len() < PCL5_ITEMS {
            return Err(ToolError::Incomplete {
                missing: PCL5_ITEMS - responses.len(),
            });
        }

        let assessment = Pcl5Assessment {
            id: ts,
            ts,
            timeframe: draft.timeframe,
            total: responses.iter().map(|&r| u32::from(r)).sum(),
            responses,
            notes: draft.notes.trim().to_string(),
        };
        let mut all: Vec<Pcl5Assessment> = load_for_update(self.store, keys::PCL5_ENTRIES)?;
        all.insert(0, assessment.clone());
        persist(self.store, keys::PCL5_ENTRIES, &all)?;
        Ok(assessment)
    }

    pub fn delete(&mut self, id: i64) -> Result<(), ToolError> {
        let mut all: Vec<Pcl5Assessment> = load_for_update(self.store, keys::PCL5_ENTRIES)?;
        all.retain(|a| a.id != id);
        persist(self.store, keys::PCL5_ENTRIES, &all)
    }

    pub fn clear(&mut self) -> Result<(), ToolError> {
        persist(self.store, keys::PCL5_ENTRIES, &Vec::<Pcl5Assessment>::new())
    }

    pub fn load_draft(&self) -> Pcl5Draft {
        sanitize(load_doc(self.store, keys::PCL5_DRAFT).unwrap_or_default())
    }

    pub fn save_draft(&mut self, draft: &Pcl5Draft) -> Result<(), ToolError> {
        persist(self.store, keys::PCL5_DRAFT, &sanitize(draft.clone()))
    }
}

/// Exactly [`PCL5_ITEMS`] responses; out-of-range answers become unanswered.
fn sanitize(mut draft: Pcl5Draft) -> Pcl5Draft {
    draft.responses.resize(PCL5_ITEMS, None);
    for r in &mut draft.responses {
        if r.is_some_and(|v| v > PCL5_MAX_ITEM) {
            *r = None;
        }
    }
    draft
}
