//! Rule-based intent classification.
//!
//! Distinguishes bare greetings and calculator requests from knowledge
//! queries. Pure functions over the text; ambiguity always falls through
//! to `Knowledge`, the safer branch -- retrieval may still answer where a
//! raw arithmetic failure cannot.

use hrdesk_types::answer::Intent;

/// Greeting phrases recognized when they constitute the entire utterance.
const GREETINGS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
    "good day",
    "hi there",
    "hey there",
    "hello there",
    "sup",
    "whats up",
    "yo",
    "hiya",
    "howdy",
    "salaam",
    "assalam",
    "salam",
];

/// Keywords that signal a numeric-operation request.
const CALC_KEYWORDS: &[&str] = &[
    "calculate",
    "calculation",
    "compute",
    "project",
    "breakdown",
    "bonus",
    "deduction",
    "encashment",
    "provident",
    "leave balance",
    "remaining leave",
];

/// Pronouns that can carry a calculator request's subject ("his eid bonus").
const ENTITY_REFS: &[&str] = &["he", "his", "him", "she", "her", "they", "their", "them"];

/// Lowercase, strip punctuation (apostrophes dropped, not split), collapse
/// whitespace.
pub fn normalize(utterance: &str) -> String {
    let lowered = utterance.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .filter_map(|c| {
            if c == '\'' {
                None
            } else if c.is_alphanumeric() {
                Some(c)
            } else {
                Some(' ')
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify an utterance as greeting, calculator request, or knowledge query.
///
/// Greeting only when the greeting phrase is the *entire* normalized
/// utterance: "Hi, what is my leave balance?" is a knowledge query, not a
/// greeting. Calculator requires a numeric-operation keyword together with
/// either a numeric token or (when history exists to resolve against) an
/// entity reference.
pub fn classify(utterance: &str, session_has_history: bool) -> Intent {
    let normalized = normalize(utterance);
    if normalized.is_empty() {
        return Intent::Knowledge;
    }

    if GREETINGS.contains(&normalized.as_str()) {
        return Intent::Greeting;
    }

    let has_calc_keyword = CALC_KEYWORDS.iter().any(|kw| normalized.contains(kw));
    if has_calc_keyword {
        let has_number = normalized.chars().any(|c| c.is_ascii_digit());
        let has_entity_ref = session_has_history
            && normalized
                .split_whitespace()
                .any(|word| ENTITY_REFS.contains(&word));
        if has_number || has_entity_ref {
            return Intent::Calculator;
        }
    }

    Intent::Knowledge
}
