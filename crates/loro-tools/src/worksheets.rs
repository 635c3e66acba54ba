//! Single-document worksheets: the ABC thought record and the VA skills
//! worksheets. Each loads as its stored fields merged over the worksheet's
//! blank form, and is stamped with `lastSavedAt` on save.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use loro_core::types::{AbcThoughtRecord, FieldValue, Worksheet};
use loro_storage::{KeyValueStore, StorageBackend};

use crate::doc::load_doc;
use crate::error::ToolError;
use crate::{keys, persist};

/// The VA skills worksheets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorksheetKind {
    ChangeNegativeThinking,
    ChallengingQuestions,
    TraumaReminders,
    ValuesGoals,
    Assertive,
    Enjoyable,
    WriteToReflect,
    ProblemSolve,
}

impl WorksheetKind {
    pub const ALL: [WorksheetKind; 8] = [
        Self::ChangeNegativeThinking,
        Self::ChallengingQuestions,
        Self::TraumaReminders,
        Self::ValuesGoals,
        Self::Assertive,
        Self::Enjoyable,
        Self::WriteToReflect,
        Self::ProblemSolve,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::ChangeNegativeThinking => keys::VA_CHANGE_NEGATIVE_THINKING,
            Self::ChallengingQuestions => keys::VA_CHALLENGING_QUESTIONS,
            Self::TraumaReminders => keys::VA_TRAUMA_REMINDERS,
            Self::ValuesGoals => keys::VA_VALUES_GOALS,
            Self::Assertive => keys::VA_ASSERTIVE,
            Self::Enjoyable => keys::VA_ENJOYABLE,
            Self::WriteToReflect => keys::VA_WRITE_TO_REFLECT,
            Self::ProblemSolve => keys::VA_PROBLEM_SOLVE,
        }
    }

    /// Blank form fields, excluding `date` and `lastSavedAt`
    pub fn default_fields(self) -> BTreeMap<String, FieldValue> {
        let text = |name: &str, value: &str| (name.to_string(), FieldValue::text(value));
        let rows = |name: &str| (name.to_string(), FieldValue::blank_rows());

        match self {
            Self::ChangeNegativeThinking => BTreeMap::from([
                text("situation", ""),
                text("thought", ""),
                rows("evidenceFor"),
                rows("evidenceAgainst"),
                text("balanced", ""),
            ]),
            Self::ChallengingQuestions => BTreeMap::from([
                ("questionsPicked".to_string(), FieldValue::List(Vec::new())),
                text("notes", ""),
            ]),
            Self::TraumaReminders => BTreeMap::from([
                text("reminder", ""),
                rows("earlySigns"),
                rows("copingPlan"),
            ]),
            Self::ValuesGoals => {
                BTreeMap::from([rows("values"), rows("goals"), text("firstStep", "")])
            }
            Self::Assertive => BTreeMap::from([
                text("situation", ""),
                text("rightsNeeds", ""),
                text("statement", ""),
                text("practiceNotes", ""),
            ]),
            Self::Enjoyable => BTreeMap::from([rows("ideas"), text("plan", "")]),
            Self::WriteToReflect => BTreeMap::from([
                text(
                    "prompt",
                    "Write freely about a recent challenge. Notice thoughts, feelings, and what matters to you.",
                ),
                text("entry", ""),
            ]),
            Self::ProblemSolve => BTreeMap::from([
                text("problem", ""),
                rows("options"),
                text("chosen", ""),
                rows("steps"),
            ]),
        }
    }

    /// Blank form dated `today`
    pub fn blank(self, today: NaiveDate) -> Worksheet {
        Worksheet {
            date: iso_date(today),
            last_saved_at: None,
            fields: self.default_fields(),
        }
    }
}

/// Repository for one VA worksheet
pub struct Worksheets<'a, B> {
    store: &'a mut KeyValueStore<B>,
    kind: WorksheetKind,
}

impl<'a, B: StorageBackend> Worksheets<'a, B> {
    pub fn new(store: &'a mut KeyValueStore<B>, kind: WorksheetKind) -> Self {
        Self { store, kind }
    }

    /// Stored fields over the blank form. Fields the form does not know are
    /// kept.
    pub fn load(&self, today: NaiveDate) -> Worksheet {
        let mut sheet = self.kind.blank(today);
        if let Some(stored) = load_doc::<_, Worksheet>(self.store, self.kind.key()) {
            sheet.fields.extend(stored.fields);
            if !stored.date.is_empty() {
                sheet.date = stored.date;
            }
            sheet.last_saved_at = stored.last_saved_at;
        }
        sheet
    }

    /// Write `sheet` stamped with `now`; returns what was stored.
    pub fn save(&mut self, sheet: &Worksheet, now: DateTime<Utc>) -> Result<Worksheet, ToolError> {
        let mut sheet = sheet.clone();
        sheet.last_saved_at = Some(stamp(now));
        persist(self.store, self.kind.key(), &sheet)?;
        Ok(sheet)
    }

    /// Replace the stored worksheet with a blank one dated `today`.
    pub fn reset(&mut self, today: NaiveDate) -> Result<Worksheet, ToolError> {
        let sheet = self.kind.blank(today);
        persist(self.store, self.kind.key(), &sheet)?;
        Ok(sheet)
    }
}

/// The ABC (activating event, beliefs, consequences) thought record
pub struct AbcRecord<'a, B> {
    store: &'a mut KeyValueStore<B>,
}

impl<'a, B: StorageBackend> AbcRecord<'a, B> {
    pub fn new(store: &'a mut KeyValueStore<B>) -> Self {
        Self { store }
    }

    pub fn load(&self, today: NaiveDate) -> AbcThoughtRecord {
        let mut record: AbcThoughtRecord =
            load_doc(self.store, keys::ABC_RECORD).unwrap_or_default();
        if record.date.is_empty() {
            record.date = iso_date(today);
        }
        clamp_ratings(&mut record);
        record
    }

    pub fn save(
        &mut self,
        record: &AbcThoughtRecord,
        now: DateTime<Utc>,
    ) -> Result<AbcThoughtRecord, ToolError> {
        let mut record = record.clone();
        clamp_ratings(&mut record);
        record.last_saved_at = Some(stamp(now));
        persist(self.store, keys::ABC_RECORD, &record)?;
        Ok(record)
    }
}

fn clamp_ratings(record: &mut AbcThoughtRecord) {
    for emotion in &mut record.emotions {
        emotion.intensity = emotion.intensity.min(100);
    }
    record.outcome.intensity_after = record.outcome.intensity_after.min(100);
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn stamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}
