//! loro-tools: typed repositories for each self-help tool's local records
//!
//! Every repository borrows a [`KeyValueStore`]. Reads are fail-soft: missing
//! data yields defaults, `null` fields take their default values and entries
//! that do not parse are skipped. Writes that modify an existing document
//! re-read it strictly and fail with [`ToolError::Unreadable`] rather than
//! replace data they could not parse. A rejected write is
//! [`ToolError::NotSaved`].
//!
//! [`KeyValueStore`]: loro_storage::KeyValueStore

pub mod bls;
pub mod crisis;
mod doc;
pub mod effect;
pub mod error;
pub mod journal;
pub mod mood;
pub mod pcl5;
pub mod reasons;
pub mod resources;
pub mod thoughts;
pub mod worksheets;

pub use bls::BilateralPrefs;
pub use crisis::CrisisContacts;
pub use effect::{EffectFilter, EffectivenessLog, Kpis};
pub use error::ToolError;
pub use journal::JournalHistory;
pub use mood::MoodTracker;
pub use pcl5::Pcl5Tracker;
pub use reasons::ReasonsList;
pub use resources::RelaxResources;
pub use thoughts::ThoughtLog;
pub use worksheets::{AbcRecord, WorksheetKind, Worksheets};

use loro_storage::{KeyValueStore, StorageBackend};
use serde::Serialize;

/// Store keys (without namespace) owned by each tool
pub mod keys {
    pub const MOOD: &str = "mood:entries";
    pub const EFFECT: &str = "effect:sessions";
    pub const THOUGHTS: &str = "cog:entries";
    pub const JOURNAL: &str = "journal:history";
    pub const REASONS: &str = "reasons:v1";
    pub const CRISIS: &str = "crisis:contacts";
    pub const BLS: &str = "bls:prefs";
    pub const PCL5_ENTRIES: &str = "pcl5:entries";
    pub const PCL5_DRAFT: &str = "pcl5:draft";
    pub const RELAX_RESOURCES: &str = "relax:resources";
    pub const ABC_RECORD: &str = "thought_record_v1";

    pub const VA_CHANGE_NEGATIVE_THINKING: &str = "va_change_negative_thinking_v1";
    pub const VA_CHALLENGING_QUESTIONS: &str = "va_challenging_questions_v1";
    pub const VA_TRAUMA_REMINDERS: &str = "va_trauma_reminders_v1";
    pub const VA_VALUES_GOALS: &str = "va_values_goals_v1";
    pub const VA_ASSERTIVE: &str = "va_assertive_v1";
    pub const VA_ENJOYABLE: &str = "va_enjoyable_v1";
    pub const VA_WRITE_TO_REFLECT: &str = "va_write_to_reflect_v1";
    pub const VA_PROBLEM_SOLVE: &str = "va_problem_solve_v1";
}

pub(crate) fn persist<B, T>(
    store: &mut KeyValueStore<B>,
    key: &'static str,
    value: &T,
) -> Result<(), ToolError>
where
    B: StorageBackend,
    T: Serialize + ?Sized,
{
    if store.save(key, value) {
        Ok(())
    } else {
        Err(ToolError::NotSaved { key })
    }
}
