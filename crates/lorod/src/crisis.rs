//! Local screen for self-harm language in journal entries.
//!
//! A plain phrase match. False positives only add a resources line to the
//! response, so the list errs broad.

/// Guidance returned alongside a reflection when an entry trips the screen
pub const CRISIS_MESSAGE: &str = "If you are in crisis or thinking about harming yourself, \
call or text 988 in the U.S., or dial 911 (or your local emergency number).";

const PHRASES: &[&str] = &[
    "kill myself",
    "killing myself",
    "suicide",
    "suicidal",
    "end my life",
    "ending my life",
    "take my own life",
    "want to die",
    "wanna die",
    "better off dead",
    "no reason to live",
    "self-harm",
    "self harm",
    "hurt myself",
    "hurting myself",
    "cut myself",
    "cutting myself",
    "don't want to be alive",
    "dont want to be alive",
];

/// Crisis guidance if `text` contains self-harm language.
pub fn screen(text: &str) -> Option<&'static str> {
    let normalized = text.to_lowercase().replace('\u{2019}', "'");
    PHRASES
        .iter()
        .any(|p| normalized.contains(p))
        .then_some(CRISIS_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_self_harm_language() {
        assert!(screen("Some days I think I'd be better off dead").is_some());
        assert!(screen("I keep thinking about SUICIDE").is_some());
        assert!(screen("I don\u{2019}t want to be alive anymore").is_some());
    }

    #[test]
    fn test_ordinary_entry_not_flagged() {
        assert!(screen("Work was stressful but the walk helped.").is_none());
        assert!(screen("").is_none());
    }
}
