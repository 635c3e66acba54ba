//! CBT thought records, newest first.

use loro_core::types::ThoughtRecord;
use loro_storage::{KeyValueStore, StorageBackend};

use crate::error::ToolError;
use crate::doc::{load_for_update, load_list};
use crate::{keys, persist};

/// Records kept, newest first
pub const MAX_RECORDS: usize = 500;

/// Highest SUDS rating
pub const SUDS_MAX: i32 = 10;

pub struct ThoughtLog<'a, B> {
    store: &'a mut KeyValueStore<B>,
}

impl<'a, B: StorageBackend> ThoughtLog<'a, B> {
    pub fn new(store: &'a mut KeyValueStore<B>) -> Self {
        Self { store }
    }

    pub fn records(&self) -> Vec<ThoughtRecord> {
        load_list(self.store, keys::THOUGHTS)
    }

    /// Prepend `record`, trimming free text, clamping ratings to their scales
    /// and computing `effectiveness`.
    pub fn add(&mut self, mut record: ThoughtRecord) -> Result<ThoughtRecord, ToolError> {
        for field in [
            &mut record.situation,
            &mut record.thought,
            &mut record.emotions,
            &mut record.evidence_for,
            &mut record.evidence_against,
            &mut record.reframe,
            &mut record.action,
        ] {
            *field = field.trim().to_string();
        }
        record.intensity = record.intensity.min(100);
        record.suds_before = record.suds_before.clamp(0, SUDS_MAX);
        record.suds_after = record.suds_after.clamp(0, SUDS_MAX);
        record.effectiveness = record.suds_before - record.suds_after;

        let mut records: Vec<ThoughtRecord> = load_for_update(self.store, keys::THOUGHTS)?;
        records.insert(0, record.clone());
        records.truncate(MAX_RECORDS);
        persist(self.store, keys::THOUGHTS, &records)?;
        Ok(record)
    }

    pub fn recent(&self, n: usize) -> Vec<ThoughtRecord> {
        let mut records = self.records();
        records.truncate(n);
        records
    }
}
