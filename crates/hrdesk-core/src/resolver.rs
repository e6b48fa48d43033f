//! Anaphora resolution against session history.
//!
//! Rewrites a follow-up utterance containing pronouns into a self-contained
//! query using the session's last-known-entity records. The resolver only
//! reads the session; entity records are written through the session store's
//! single mutation point after generation completes.
//!
//! A failed resolution leaves the token verbatim -- an unresolved pronoun is
//! preferable to a fabricated referent.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use hrdesk_types::session::{EntityClass, Session};

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]+").unwrap());

/// Two-or-more consecutive capitalized words.
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b").unwrap());

/// Capitalized words that start a candidate name match but are not part of
/// a person's name.
const LEADING_STOPWORDS: &[&str] = &[
    "Employee", "The", "What", "Who", "How", "Is", "Are", "Can", "Does", "Do", "Please", "Hello",
    "Hi", "His", "Her", "Their", "My", "Our", "Your", "This", "That", "These", "Those", "If",
    "When", "Where", "Why",
];

/// Anaphoric tokens substituted as possessives (`{name}'s`).
const POSSESSIVE: &[&str] = &["his", "her", "hers", "their", "its"];

/// Anaphoric tokens standing for a non-person subject.
const TOPIC: &[&str] = &["it", "its", "this", "that"];

/// Rewrites follow-up utterances using the session's entity records.
pub struct ReferenceResolver {
    anaphors: HashSet<String>,
}

impl ReferenceResolver {
    /// Build a resolver over the configured anaphor set.
    pub fn new(anaphors: &[String]) -> Self {
        Self {
            anaphors: anaphors.iter().map(|a| a.to_lowercase()).collect(),
        }
    }

    /// Resolve anaphoric tokens in `utterance` against the session.
    ///
    /// Returns the utterance unchanged when it contains no anaphoric token,
    /// or when no compatible referent is recorded.
    pub fn resolve(&self, utterance: &str, session: &Session) -> String {
        let has_anaphor = WORD_RE
            .find_iter(utterance)
            .any(|m| self.anaphors.contains(&m.as_str().to_lowercase()));
        if !has_anaphor {
            return utterance.to_string();
        }

        WORD_RE
            .replace_all(utterance, |caps: &regex::Captures| {
                let word = &caps[0];
                let lower = word.to_lowercase();
                if !self.anaphors.contains(&lower) {
                    return word.to_string();
                }
                let (class, possessive) = classify_anaphor(&lower);
                match session.latest_entity(class) {
                    Some(entity) if possessive => format!("{}'s", entity.name),
                    Some(entity) => entity.name.clone(),
                    None => word.to_string(),
                }
            })
            .into_owned()
    }
}

fn classify_anaphor(token: &str) -> (EntityClass, bool) {
    let possessive = POSSESSIVE.contains(&token);
    let class = if TOPIC.contains(&token) {
        EntityClass::Topic
    } else {
        EntityClass::Person
    };
    (class, possessive)
}

/// Extract person names (consecutive capitalized words) from text.
///
/// Leading non-name capitalized words (titles, sentence starters) are
/// stripped; matches with fewer than two remaining words are discarded.
/// Order preserved, duplicates removed.
pub fn extract_person_names(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for m in NAME_RE.find_iter(text) {
        let mut words: Vec<&str> = m.as_str().split_whitespace().collect();
        while let Some(first) = words.first() {
            if LEADING_STOPWORDS.contains(first) {
                words.remove(0);
            } else {
                break;
            }
        }
        if words.len() >= 2 {
            let name = words.join(" ");
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
    }

    names
}
