//! Intent classification and final answer types.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// The engine's classification of an incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// A bare greeting; answered from a template, no retrieval or model call.
    Greeting,
    /// A parseable numeric request; answered deterministically.
    Calculator,
    /// Everything else; answered through retrieval-augmented generation.
    Knowledge,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Greeting => write!(f, "greeting"),
            Intent::Calculator => write!(f, "calculator"),
            Intent::Knowledge => write!(f, "knowledge"),
        }
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greeting" => Ok(Intent::Greeting),
            "calculator" => Ok(Intent::Calculator),
            "knowledge" => Ok(Intent::Knowledge),
            other => Err(format!("invalid intent: '{other}'")),
        }
    }
}

/// Quality tag attached to an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Deterministic answer (greeting template or calculator).
    Direct,
    /// Generated with retrieved grounding.
    Grounded,
    /// Generated despite a recoverable failure (no grounding, truncated prompt).
    Degraded,
    /// Generation failed after the retry budget; the answer is an apology.
    Unavailable,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Direct => write!(f, "direct"),
            Confidence::Grounded => write!(f, "grounded"),
            Confidence::Degraded => write!(f, "degraded"),
            Confidence::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(Confidence::Direct),
            "grounded" => Ok(Confidence::Grounded),
            "degraded" => Ok(Confidence::Degraded),
            "unavailable" => Ok(Confidence::Unavailable),
            other => Err(format!("invalid confidence: '{other}'")),
        }
    }
}

/// The engine's answer to one message.
///
/// `sources` is empty for greeting and calculator answers. Not persisted
/// by the engine; callers own any rating/feedback records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub text: String,
    /// Document identifiers of the fragments used for grounding.
    pub sources: Vec<String>,
    pub confidence: Confidence,
}

impl AnswerResult {
    /// A deterministic answer with no grounding sources.
    pub fn direct(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
            confidence: Confidence::Direct,
        }
    }
}
