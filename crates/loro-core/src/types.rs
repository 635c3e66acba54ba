//! Typed documents persisted by the self-help tools.
//!
//! Field names follow the camelCase JSON written by the browser app so that
//! existing local storage exports load unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of items in the PCL-5 checklist
pub const PCL5_ITEMS: usize = 20;

/// Highest score a single PCL-5 item can take
pub const PCL5_MAX_ITEM: u8 = 4;

/// Stanley–Brown style safety plan. Stored only inside the encrypted vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SafetyPlan {
    pub triggers: String,
    pub warning_signs: Vec<String>,
    pub coping_strategies: Vec<String>,
    pub places_for_distraction: Vec<String>,
    pub people_for_support: Vec<SupportPerson>,
    pub professionals: Vec<ProfessionalContact>,
    pub means_safety: Vec<String>,
    pub medications: String,
    /// RFC 3339 timestamp of the last successful save
    pub last_saved_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportPerson {
    pub name: String,
    pub contact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfessionalContact {
    pub label: String,
    pub contact: String,
}

impl Default for SafetyPlan {
    fn default() -> Self {
        Self {
            triggers: String::new(),
            warning_signs: Vec::new(),
            coping_strategies: Vec::new(),
            places_for_distraction: Vec::new(),
            people_for_support: Vec::new(),
            professionals: vec![
                ProfessionalContact {
                    label: "Therapist/Clinician".into(),
                    contact: String::new(),
                },
                ProfessionalContact {
                    label: "988 Suicide & Crisis Lifeline (US)".into(),
                    contact: "Call/Text 988".into(),
                },
                ProfessionalContact {
                    label: "Emergency (US)".into(),
                    contact: "Call 911".into(),
                },
            ],
            means_safety: Vec::new(),
            medications: String::new(),
            last_saved_at: None,
        }
    }
}

/// One day of mood tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoodEntry {
    /// 1–5
    pub mood: u8,
    /// 1–5
    pub arousal: u8,
    /// 0–12
    pub sleep_hours: f32,
    pub notes: String,
    /// Unix timestamp in milliseconds
    pub ts: i64,
}

impl Default for MoodEntry {
    fn default() -> Self {
        Self {
            mood: 3,
            arousal: 3,
            sleep_hours: 7.0,
            notes: String::new(),
            ts: 0,
        }
    }
}

/// Mood entries keyed by ISO date (`YYYY-MM-DD`)
pub type MoodLog = BTreeMap<String, MoodEntry>;

/// Whether a SUDS session was logged by hand or by a tool at session end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOrigin {
    #[default]
    Manual,
    Auto,
}

/// Before/after distress rating for one use of a tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EffectivenessSession {
    pub tool: String,
    pub before: f64,
    pub after: f64,
    /// `before - after`
    pub delta: f64,
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    pub ts: i64,
    pub origin: SessionOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// CBT thought-challenger record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThoughtRecord {
    pub date: String,
    pub situation: String,
    pub thought: String,
    pub emotions: String,
    /// 0–100
    pub intensity: u8,
    pub distortions: Vec<String>,
    pub evidence_for: String,
    pub evidence_against: String,
    pub reframe: String,
    pub action: String,
    pub suds_before: i32,
    pub suds_after: i32,
    /// `suds_before - suds_after`
    pub effectiveness: i32,
    pub ts: i64,
}

impl Default for ThoughtRecord {
    fn default() -> Self {
        Self {
            date: String::new(),
            situation: String::new(),
            thought: String::new(),
            emotions: String::new(),
            intensity: 60,
            distortions: Vec::new(),
            evidence_for: String::new(),
            evidence_against: String::new(),
            reframe: String::new(),
            action: String::new(),
            suds_before: 6,
            suds_after: 3,
            effectiveness: 3,
            ts: 0,
        }
    }
}

/// One emotion named on an ABC thought record, rated 0–100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionRating {
    pub name: String,
    pub intensity: u8,
}

impl Default for EmotionRating {
    fn default() -> Self {
        Self {
            name: String::new(),
            intensity: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Outcome {
    pub notes: String,
    /// Emotion intensity after the reframe, 0–100
    pub intensity_after: u8,
}

impl Default for Outcome {
    fn default() -> Self {
        Self {
            notes: String::new(),
            intensity_after: 40,
        }
    }
}

/// Single-document ABC thought record worksheet. List fields start with one
/// blank row for the form to fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AbcThoughtRecord {
    /// ISO date (`YYYY-MM-DD`)
    pub date: String,
    pub situation: String,
    pub emotions: Vec<EmotionRating>,
    pub automatic_thoughts: Vec<String>,
    pub evidence_for: Vec<String>,
    pub evidence_against: Vec<String>,
    pub alternative_thought: String,
    pub outcome: Outcome,
    pub last_saved_at: Option<String>,
}

impl Default for AbcThoughtRecord {
    fn default() -> Self {
        Self {
            date: String::new(),
            situation: String::new(),
            emotions: vec![EmotionRating::default()],
            automatic_thoughts: vec![String::new()],
            evidence_for: vec![String::new()],
            evidence_against: vec![String::new()],
            alternative_thought: String::new(),
            outcome: Outcome::default(),
            last_saved_at: None,
        }
    }
}

/// A worksheet field: free text or a list of rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(s: &str) -> Self {
        Self::Text(s.to_string())
    }

    /// A list holding one blank row
    pub fn blank_rows() -> Self {
        Self::List(vec![String::new()])
    }
}

/// Free-form worksheet document. Field names vary per worksheet and are
/// stored flat beside `date` and `lastSavedAt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Worksheet {
    pub date: String,
    pub last_saved_at: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: i64,
    pub content: String,
    pub created_at: i64,
}

/// A "reason for living" card
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Reason {
    pub id: String,
    pub text: String,
    pub image_url: String,
    pub ts: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrisisContact {
    pub name: String,
    pub phone: String,
}

/// Bilateral stimulation preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlsPrefs {
    /// Sweeps per minute (10–180)
    pub speed: u32,
    /// Session length in seconds
    pub duration: u32,
    pub dot_size: u32,
    pub dot_color: String,
    pub audio_on: bool,
    /// 0.0–1.0
    pub volume: f32,
    pub tone_hz: u32,
    pub invert_audio: bool,
    pub vibrate_on: bool,
}

impl Default for BlsPrefs {
    fn default() -> Self {
        Self {
            speed: 60,
            duration: 120,
            dot_size: 18,
            dot_color: "#22d3ee".into(),
            audio_on: false,
            volume: 0.3,
            tone_hz: 440,
            invert_audio: true,
            vibrate_on: false,
        }
    }
}

/// Lookback window a PCL-5 assessment refers to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Week,
    #[default]
    Month,
}

/// A completed PCL-5 assessment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pcl5Assessment {
    pub id: i64,
    pub ts: i64,
    pub timeframe: Timeframe,
    /// Sum of all responses (0–80)
    pub total: u32,
    pub responses: Vec<u8>,
    pub notes: String,
}

/// In-progress PCL-5 answers, autosaved between visits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pcl5Draft {
    pub responses: Vec<Option<u8>>,
    pub notes: String,
    pub timeframe: Timeframe,
}

impl Default for Pcl5Draft {
    fn default() -> Self {
        Self {
            responses: vec![None; PCL5_ITEMS],
            notes: String::new(),
            timeframe: Timeframe::Month,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_plan_partial_json_fills_defaults() {
        let plan: SafetyPlan = serde_json::from_str(r#"{"triggers":"x"}"#).unwrap();
        assert_eq!(plan.triggers, "x");
        assert!(plan.warning_signs.is_empty());
        assert_eq!(plan.professionals.len(), 3);
        assert!(plan.last_saved_at.is_none());
    }

    #[test]
    fn test_safety_plan_camel_case_fields() {
        let plan = SafetyPlan {
            warning_signs: vec!["can't sleep".into()],
            people_for_support: vec![SupportPerson {
                name: "Sam".into(),
                contact: "555-0100".into(),
            }],
            ..Default::default()
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["warningSigns"][0], "can't sleep");
        assert_eq!(json["peopleForSupport"][0]["name"], "Sam");
        assert!(json.get("warning_signs").is_none());
    }

    #[test]
    fn test_mood_entry_defaults() {
        let entry: MoodEntry = serde_json::from_str(r#"{"mood":5}"#).unwrap();
        assert_eq!(entry.mood, 5);
        assert_eq!(entry.arousal, 3);
        assert_eq!(entry.sleep_hours, 7.0);
    }

    #[test]
    fn test_effectiveness_session_wire_names() {
        let json = r#"{"tool":"Breath","before":7,"after":4,"delta":3,
                       "dateISO":"2026-03-01","ts":1,"origin":"auto"}"#;
        let s: EffectivenessSession = serde_json::from_str(json).unwrap();
        assert_eq!(s.date_iso, "2026-03-01");
        assert_eq!(s.origin, SessionOrigin::Auto);
        assert!(s.notes.is_none());
    }

    #[test]
    fn test_bls_prefs_defaults() {
        let prefs: BlsPrefs = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs, BlsPrefs::default());
        assert!(prefs.invert_audio);
    }

    #[test]
    fn test_abc_record_partial_json_keeps_blank_rows() {
        let rec: AbcThoughtRecord =
            serde_json::from_str(r#"{"situation":"meeting","outcome":{"notes":"calmer"}}"#)
                .unwrap();
        assert_eq!(rec.situation, "meeting");
        assert_eq!(rec.emotions, [EmotionRating::default()]);
        assert_eq!(rec.automatic_thoughts, [""]);
        assert_eq!(rec.outcome.notes, "calmer");
        assert_eq!(rec.outcome.intensity_after, 40);
    }

    #[test]
    fn test_worksheet_fields_stored_flat() {
        let json = r#"{"date":"2026-03-01","lastSavedAt":null,"plan":"walk","ideas":["a","b"]}"#;
        let sheet: Worksheet = serde_json::from_str(json).unwrap();
        assert_eq!(sheet.date, "2026-03-01");
        assert_eq!(sheet.fields["plan"], FieldValue::text("walk"));
        assert_eq!(sheet.fields["ideas"], FieldValue::List(vec!["a".into(), "b".into()]));

        let back = serde_json::to_value(&sheet).unwrap();
        assert_eq!(back["ideas"][1], "b");
        assert!(back.get("fields").is_none());
    }

    #[test]
    fn test_pcl5_draft_default_has_all_items() {
        let draft = Pcl5Draft::default();
        assert_eq!(draft.responses.len(), PCL5_ITEMS);
        assert!(draft.responses.iter().all(Option::is_none));
    }
}
