//! Session and turn types for HRDesk.
//!
//! A session is one conversation: an ordered, bounded sequence of turns plus
//! the last-known-entity records the reference resolver reads. Sessions are
//! owned by the session store in `hrdesk-core` and mutated only through it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a session.
///
/// Computed from `last_activity` against the configured timeouts:
/// `Active` while recent, `Idle` past the idle timeout (history retained),
/// `Expired` past the retention timeout (history discarded, identifier
/// reusable for a fresh session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Idle,
    Expired,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::Expired => write!(f, "expired"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "idle" => Ok(SessionStatus::Idle),
            "expired" => Ok(SessionStatus::Expired),
            other => Err(format!("invalid session status: '{other}'")),
        }
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            other => Err(format!("invalid turn role: '{other}'")),
        }
    }
}

/// A single exchange entry in a session. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    /// What the user typed or what the assistant answered, verbatim.
    pub text: String,
    /// Post-resolution query text (user turns only).
    pub resolved_text: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Identifiers of the fragments grounding this answer (assistant turns only).
    #[serde(default)]
    pub sources: Vec<String>,
}

impl Turn {
    /// Build a user turn, recording the resolved query when it differs.
    pub fn user(text: impl Into<String>, resolved: Option<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            resolved_text: resolved,
            created_at: Utc::now(),
            sources: Vec::new(),
        }
    }

    /// Build an assistant turn with its grounding sources.
    pub fn assistant(text: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            resolved_text: None,
            created_at: Utc::now(),
            sources,
        }
    }
}

/// Which pronoun class an entity can stand in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityClass {
    /// A named person (he/she/they and possessives).
    Person,
    /// A non-person subject (it/this/that).
    Topic,
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityClass::Person => write!(f, "person"),
            EntityClass::Topic => write!(f, "topic"),
        }
    }
}

impl FromStr for EntityClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "person" => Ok(EntityClass::Person),
            "topic" => Ok(EntityClass::Topic),
            other => Err(format!("invalid entity class: '{other}'")),
        }
    }
}

/// A referent recorded for later pronoun resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    pub class: EntityClass,
    pub recorded_at: DateTime<Utc>,
}

/// One conversation: bounded turn history plus last-known-entity records.
///
/// Mutated only through the session store; the reference resolver reads
/// `entities` and never writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque identifier, unique per conversation.
    pub id: String,
    /// Ordered turn history, oldest first. Bounded by the store.
    pub turns: Vec<Turn>,
    /// Last-known entities, oldest first; resolution scans from the back.
    pub entities: Vec<EntityRecord>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session with empty history.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            turns: Vec::new(),
            entities: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Whether any exchange has been recorded yet.
    pub fn has_history(&self) -> bool {
        !self.turns.is_empty()
    }

    /// Most recent entity of the given class, if any.
    pub fn latest_entity(&self, class: EntityClass) -> Option<&EntityRecord> {
        self.entities.iter().rev().find(|e| e.class == class)
    }
}
