//! Retrieved corpus fragment types.
//!
//! Fragments are transient: produced per query by the retrieval store,
//! threaded through prompt assembly, referenced by id in answers, and
//! never persisted by the engine.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Which corpus a fragment originated from.
///
/// Ordering matters for ranking tie-breaks: policy documents outrank
/// employee records, which outrank FAQ entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corpus {
    Policy,
    Employee,
    Faq,
}

impl Corpus {
    /// Tie-break priority; lower wins.
    pub fn priority(&self) -> u8 {
        match self {
            Corpus::Policy => 0,
            Corpus::Employee => 1,
            Corpus::Faq => 2,
        }
    }
}

impl fmt::Display for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Corpus::Policy => write!(f, "policy"),
            Corpus::Employee => write!(f, "employee"),
            Corpus::Faq => write!(f, "faq"),
        }
    }
}

impl FromStr for Corpus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "policy" => Ok(Corpus::Policy),
            "employee" => Ok(Corpus::Employee),
            "faq" => Ok(Corpus::Faq),
            other => Err(format!("invalid corpus: '{other}'")),
        }
    }
}

/// A retrieved span of source text with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedFragment {
    /// Identifier of the source document.
    pub document_id: String,
    /// The retrieved text span.
    pub text: String,
    /// Similarity score; higher is more relevant.
    pub score: f32,
    pub corpus: Corpus,
}
