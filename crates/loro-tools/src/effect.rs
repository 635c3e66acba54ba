//! Before/after distress ratings for tool sessions.

use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate};
use tracing::debug;

use loro_core::types::{EffectivenessSession, SessionOrigin};
use loro_storage::{KeyValueStore, StorageBackend};

use crate::error::ToolError;
use crate::doc::{load_for_update, load_list};
use crate::{keys, persist};

/// Sessions kept, newest first
pub const MAX_SESSIONS: usize = 1000;

/// Row filter for [`EffectivenessLog::query`].
#[derive(Debug, Clone)]
pub struct EffectFilter {
    /// Exact tool name; `None` matches all tools
    pub tool: Option<String>,
    /// Lookback in days including today, clamped to 1–365
    pub days: u32,
    /// Case-insensitive substring of `notes`
    pub notes: Option<String>,
}

impl Default for EffectFilter {
    fn default() -> Self {
        Self {
            tool: None,
            days: 30,
            notes: None,
        }
    }
}

/// Averages over a set of sessions. `None` when there are no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Kpis {
    pub n: usize,
    pub avg_before: Option<f64>,
    pub avg_after: Option<f64>,
    pub avg_delta: Option<f64>,
}

pub struct EffectivenessLog<'a, B> {
    store: &'a mut KeyValueStore<B>,
}

impl<'a, B: StorageBackend> EffectivenessLog<'a, B> {
    pub fn new(store: &'a mut KeyValueStore<B>) -> Self {
        Self { store }
    }

    pub fn sessions(&self) -> Vec<EffectivenessSession> {
        load_list(self.store, keys::EFFECT)
    }

    /// Record a session at `ts` (Unix ms). `delta` and `dateISO` are derived.
    pub fn log(
        &mut self,
        tool: &str,
        before: f64,
        after: f64,
        notes: Option<String>,
        origin: SessionOrigin,
        ts: i64,
    ) -> Result<EffectivenessSession, ToolError> {
        let session = EffectivenessSession {
            tool: tool.trim().to_string(),
            before,
            after,
            delta: before - after,
            date_iso: date_of(ts).format("%Y-%m-%d").to_string(),
            ts,
            origin,
            notes: notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        };

        let mut rows: Vec<EffectivenessSession> = load_for_update(self.store, keys::EFFECT)?;
        rows.insert(0, session.clone());
        rows.truncate(MAX_SESSIONS);
        persist(self.store, keys::EFFECT, &rows)?;

        debug!(tool = %session.tool, delta = session.delta, "session logged");
        Ok(session)
    }

    /// Delete the session(s) recorded at `ts`.
    pub fn remove(&mut self, ts: i64) -> Result<(), ToolError> {
        let mut rows: Vec<EffectivenessSession> = load_for_update(self.store, keys::EFFECT)?;
        rows.retain(|r| r.ts != ts);
        persist(self.store, keys::EFFECT, &rows)
    }

    pub fn clear(&mut self) -> Result<(), ToolError> {
        persist(self.store, keys::EFFECT, &Vec::<EffectivenessSession>::new())
    }

    /// Distinct tool names, sorted.
    pub fn tools(&self) -> Vec<String> {
        self.sessions()
            .into_iter()
            .map(|r| r.tool)
            .filter(|t| !t.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sessions matching `filter` as of `now_ms`, newest first.
    pub fn query(&self, filter: &EffectFilter, now_ms: i64) -> Vec<EffectivenessSession> {
        let days = filter.days.clamp(1, 365);
        let start_ms = date_of(now_ms)
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map_or(i64::MIN, |dt| dt.and_utc().timestamp_millis());
        let needle = filter
            .notes
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let mut rows: Vec<_> = self
            .sessions()
            .into_iter()
            .filter(|r| filter.tool.as_ref().map_or(true, |t| &r.tool == t))
            .filter(|r| r.ts >= start_ms)
            .filter(|r| match &needle {
                Some(q) => r
                    .notes
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(q.as_str())),
                None => true,
            })
            .collect();
        rows.sort_by(|a, b| b.ts.cmp(&a.ts));
        rows
    }
}

/// Averages of `before`, `after` and `delta` over `rows`.
pub fn kpis(rows: &[EffectivenessSession]) -> Kpis {
    if rows.is_empty() {
        return Kpis::default();
    }
    let n = rows.len() as f64;
    let avg = |f: fn(&EffectivenessSession) -> f64| Some(rows.iter().map(f).sum::<f64>() / n);
    Kpis {
        n: rows.len(),
        avg_before: avg(|r| r.before),
        avg_after: avg(|r| r.after),
        avg_delta: avg(|r| r.delta),
    }
}

fn date_of(ts_ms: i64) -> NaiveDate {
    DateTime::from_timestamp_millis(ts_ms)
        .unwrap_or_default()
        .date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loro_storage::MemoryBackend;

    const DAY_MS: i64 = 86_400_000;
    // 2026-03-10T12:00:00Z
    const NOW: i64 = 1_773_144_000_000;

    fn seeded(store: &mut KeyValueStore<MemoryBackend>) {
        let mut log = EffectivenessLog::new(store);
        log.log("Breath", 7.0, 4.0, Some("before bed".into()), SessionOrigin::Manual, NOW - 40 * DAY_MS)
            .unwrap();
        log.log("Bilateral Stim", 8.0, 3.0, None, SessionOrigin::Auto, NOW - 2 * DAY_MS)
            .unwrap();
        log.log("Breath", 6.0, 5.0, Some("After work".into()), SessionOrigin::Manual, NOW)
            .unwrap();
    }

    #[test]
    fn test_log_derives_delta_and_date() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        let mut log = EffectivenessLog::new(&mut store);

        let s = log.log("Breath", 7.0, 4.0, None, SessionOrigin::Manual, NOW).unwrap();
        assert_eq!(s.delta, 3.0);
        assert_eq!(s.date_iso, "2026-03-10");
        assert_eq!(log.sessions()[0], s);
    }

    #[test]
    fn test_log_drops_blank_notes() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        let mut log = EffectivenessLog::new(&mut store);
        let s = log.log("Breath", 1.0, 1.0, Some("   ".into()), SessionOrigin::Manual, NOW).unwrap();
        assert!(s.notes.is_none());
    }

    #[test]
    fn test_query_window_and_tool() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        seeded(&mut store);
        let log = EffectivenessLog::new(&mut store);

        let rows = log.query(&EffectFilter::default(), NOW);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ts, NOW);

        let breath = EffectFilter {
            tool: Some("Breath".into()),
            days: 365,
            notes: None,
        };
        assert_eq!(log.query(&breath, NOW).len(), 2);
    }

    #[test]
    fn test_query_notes_case_insensitive() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        seeded(&mut store);
        let log = EffectivenessLog::new(&mut store);

        let filter = EffectFilter {
            notes: Some("WORK".into()),
            ..Default::default()
        };
        let rows = log.query(&filter, NOW);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].notes.as_deref(), Some("After work"));
    }

    #[test]
    fn test_query_days_clamped() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        seeded(&mut store);
        let log = EffectivenessLog::new(&mut store);

        // 0 behaves like 1: today only
        let filter = EffectFilter {
            days: 0,
            ..Default::default()
        };
        assert_eq!(log.query(&filter, NOW).len(), 1);
    }

    #[test]
    fn test_tools_sorted_unique() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        seeded(&mut store);
        let log = EffectivenessLog::new(&mut store);
        assert_eq!(log.tools(), ["Bilateral Stim", "Breath"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        seeded(&mut store);
        let mut log = EffectivenessLog::new(&mut store);

        log.remove(NOW).unwrap();
        assert_eq!(log.sessions().len(), 2);
        log.clear().unwrap();
        assert!(log.sessions().is_empty());
    }

    #[test]
    fn test_log_keeps_sessions_with_null_ratings() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        store.save_raw(
            keys::EFFECT,
            r#"[{"tool":"Breath","before":null,"after":3,"delta":null,"dateISO":"2026-03-01","ts":10,"origin":"auto"},
                {"tool":"BLS","before":6,"after":2,"delta":4,"dateISO":"2026-03-01","ts":5,"origin":"manual"}]"#,
        );

        let mut log = EffectivenessLog::new(&mut store);
        log.log("Relax", 5.0, 1.0, None, SessionOrigin::Manual, 20)
            .unwrap();

        let sessions = log.sessions();
        let ts: Vec<i64> = sessions.iter().map(|s| s.ts).collect();
        assert_eq!(ts, [20, 10, 5]);
        assert_eq!(sessions[1].before, 0.0);
    }

    #[test]
    fn test_log_refuses_to_overwrite_unreadable_history() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        let raw = r#"[{"tool":"Breath","before":"seven","ts":10}]"#;
        store.save_raw(keys::EFFECT, raw);

        let mut log = EffectivenessLog::new(&mut store);
        assert!(log.sessions().is_empty());
        assert!(matches!(
            log.log("Relax", 5.0, 1.0, None, SessionOrigin::Manual, 20),
            Err(ToolError::Unreadable { .. })
        ));
        assert!(matches!(log.remove(10), Err(ToolError::Unreadable { .. })));
        assert_eq!(store.load_raw(keys::EFFECT).as_deref(), Some(raw));
    }

    #[test]
    fn test_kpis() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        seeded(&mut store);
        let log = EffectivenessLog::new(&mut store);

        let k = kpis(&log.sessions());
        assert_eq!(k.n, 3);
        assert_eq!(k.avg_before, Some(7.0));
        assert_eq!(k.avg_delta, Some(3.0));

        assert_eq!(kpis(&[]), Kpis::default());
    }

    #[test]
    fn test_log_caps_history() {
        let mut store = KeyValueStore::new(MemoryBackend::new());
        let rows: Vec<EffectivenessSession> = (0..MAX_SESSIONS as i64)
            .map(|ts| EffectivenessSession {
                ts,
                ..Default::default()
            })
            .collect();
        store.save(keys::EFFECT, &rows);

        let mut log = EffectivenessLog::new(&mut store);
        log.log("Breath", 5.0, 2.0, None, SessionOrigin::Auto, NOW).unwrap();

        let rows = log.sessions();
        assert_eq!(rows.len(), MAX_SESSIONS);
        assert_eq!(rows[0].ts, NOW);
    }
}
