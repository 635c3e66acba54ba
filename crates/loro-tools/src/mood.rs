//! Daily mood check-ins keyed by ISO date.

use chrono::{Days, NaiveDate};

use loro_core::types::{MoodEntry, MoodLog};
use loro_storage::{KeyValueStore, StorageBackend};

use crate::error::ToolError;
use crate::doc::{load_for_update, load_map};
use crate::{keys, persist};

/// Value used for the sparkline before the first recorded day
const SPARKLINE_SEED: u8 = 3;

pub struct MoodTracker<'a, B> {
    store: &'a mut KeyValueStore<B>,
}

impl<'a, B: StorageBackend> MoodTracker<'a, B> {
    pub fn new(store: &'a mut KeyValueStore<B>) -> Self {
        Self { store }
    }

    pub fn entries(&self) -> MoodLog {
        load_map(self.store, keys::MOOD)
    }

    /// Record `entry` for `date`, replacing any entry for that day.
    /// Ratings are clamped to their scales.
    pub fn record(&mut self, date: NaiveDate, mut entry: MoodEntry) -> Result<(), ToolError> {
        entry.mood = entry.mood.clamp(1, 5);
        entry.arousal = entry.arousal.clamp(1, 5);
        entry.sleep_hours = entry.sleep_hours.clamp(0.0, 12.0);

        let mut log: MoodLog = load_for_update(self.store, keys::MOOD)?;
        log.insert(iso(date), entry);
        persist(self.store, keys::MOOD, &log)
    }

    pub fn get(&self, date: NaiveDate) -> Option<MoodEntry> {
        self.entries().remove(&iso(date))
    }

    /// Up to `n` entries, newest date first.
    pub fn recent(&self, n: usize) -> Vec<(String, MoodEntry)> {
        self.entries().into_iter().rev().take(n).collect()
    }

    /// Mood for each of the `days` days ending at `end` (oldest first).
    /// Days without an entry repeat the previous day's value.
    pub fn sparkline(&self, end: NaiveDate, days: u32) -> Vec<u8> {
        let log = self.entries();
        let mut last = SPARKLINE_SEED;
        (0..days)
            .rev()
            .map(|back| {
                let day = end.checked_sub_days(Days::new(u64::from(back)));
                if let Some(entry) = day.and_then(|d| log.get(&iso(d))) {
                    last = entry.mood;
                }
                last
            })
            .collect()
    }

    pub fn clear(&mut self) -> Result<(), ToolError> {
        persist(self.store, keys::MOOD, &MoodLog::new())
    }
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ToolError::InvalidDate(s.to_string()))
}
