//! Keyed session store with explicit lifecycle.
//!
//! Sessions live in a concurrent map of `session id -> Arc<Mutex<Session>>`:
//! one request at a time per session, full parallelism across sessions.
//! Lifecycle (Active -> Idle -> Expired) is derived from `last_activity`
//! against the configured timeouts rather than tracked as scattered flags.
//! All mutation goes through this store: appending an exchange, recording
//! entities, reset, and expiry.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use hrdesk_types::error::SessionError;
use hrdesk_types::session::{EntityClass, EntityRecord, Session, SessionStatus, Turn};

/// Maximum retained entity records per session.
const ENTITY_CAP: usize = 16;

/// Owns all conversation state, keyed by session identifier.
pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
    history_cap: usize,
    idle_timeout: Duration,
    retention_timeout: Duration,
}

impl SessionStore {
    pub fn new(history_cap: usize, idle_timeout_secs: u64, retention_timeout_secs: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            history_cap,
            idle_timeout: Duration::seconds(idle_timeout_secs as i64),
            retention_timeout: Duration::seconds(retention_timeout_secs as i64),
        }
    }

    /// Lifecycle state of a session at `now`.
    ///
    /// Both thresholds are measured from `last_activity`; the retention
    /// timeout is the longer of the two.
    pub fn status_of(&self, session: &Session, now: DateTime<Utc>) -> SessionStatus {
        let elapsed = now.signed_duration_since(session.last_activity);
        if elapsed >= self.retention_timeout {
            SessionStatus::Expired
        } else if elapsed >= self.idle_timeout {
            SessionStatus::Idle
        } else {
            SessionStatus::Active
        }
    }

    /// Fetch the session entry for `id`, creating a fresh one if absent.
    ///
    /// The caller locks the returned entry; expiry is checked under that
    /// lock (see [`SessionStore::refresh_expired`]) so the check and the
    /// restart are atomic per session.
    pub fn checkout(&self, id: &str) -> Arc<Mutex<Session>> {
        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(id))))
            .value()
            .clone()
    }

    /// Restart the session in place when it has expired.
    ///
    /// Expiry is transparent to the caller: the identifier is reused for a
    /// fresh session with empty history. Returns true when a restart
    /// happened.
    pub fn refresh_expired(&self, session: &mut Session, now: DateTime<Utc>) -> bool {
        if self.status_of(session, now) == SessionStatus::Expired {
            debug!(session_id = %session.id, "session expired, starting fresh history");
            *session = Session::new(session.id.clone());
            true
        } else {
            false
        }
    }

    /// Append one user turn and one assistant turn, then enforce the
    /// history cap (oldest evicted first) and re-arm the activity clock.
    pub fn append_exchange(&self, session: &mut Session, user: Turn, assistant: Turn) {
        session.turns.push(user);
        session.turns.push(assistant);
        while session.turns.len() > self.history_cap {
            session.turns.remove(0);
        }
        session.last_activity = Utc::now();
    }

    /// Record newly-introduced entities for later pronoun resolution.
    ///
    /// This is the single mutation point for the last-known-entity records,
    /// invoked by the orchestrator after generation completes. A name that
    /// is already the most recent of its class is not re-recorded.
    pub fn record_entities(&self, session: &mut Session, names: &[String], class: EntityClass) {
        for name in names {
            let already_latest = session
                .latest_entity(class)
                .is_some_and(|e| e.name == *name);
            if already_latest {
                continue;
            }
            session.entities.push(EntityRecord {
                name: name.clone(),
                class,
                recorded_at: Utc::now(),
            });
        }
        while session.entities.len() > ENTITY_CAP {
            session.entities.remove(0);
        }
    }

    /// Clear a session's history and entities, keeping the identifier live.
    pub async fn reset(&self, id: &str) -> bool {
        // Clone the Arc so the map guard is released before awaiting.
        let handle = match self.sessions.get(id) {
            Some(entry) => entry.value().clone(),
            None => return false,
        };
        let mut session = handle.lock().await;
        *session = Session::new(id);
        true
    }

    /// Remove a session entirely. Returns true when it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Number of tracked sessions (any lifecycle state).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop all expired sessions. Entries currently locked by an in-flight
    /// request are by definition not expired and are skipped.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => self.status_of(&session, now) != SessionStatus::Expired,
            Err(_) => true,
        });
        before - self.sessions.len()
    }

    /// Clone the current state of a session for read-only callers.
    pub async fn snapshot(&self, id: &str) -> Option<Session> {
        let handle = self.sessions.get(id)?.value().clone();
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Serialize a session to a JSON blob (external persistence hook).
    pub fn serialize(session: &Session) -> Result<String, SessionError> {
        serde_json::to_string(session).map_err(|e| SessionError::Serialization(e.to_string()))
    }

    /// Restore a session from a JSON blob produced by [`Self::serialize`],
    /// inserting it into the store. Returns the session identifier.
    pub fn deserialize(&self, blob: &str) -> Result<String, SessionError> {
        let session: Session =
            serde_json::from_str(blob).map_err(|e| SessionError::Serialization(e.to_string()))?;
        let id = session.id.clone();
        self.sessions
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        Ok(id)
    }
}
