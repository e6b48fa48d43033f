use thiserror::Error;

/// Errors from the retrieval store.
///
/// All variants are non-fatal to a conversation: the orchestrator proceeds
/// ungrounded and marks the answer degraded.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("retrieval store unavailable: {0}")]
    Unavailable(String),

    #[error("retrieval timed out")]
    Timeout,

    #[error("embedding failed: {0}")]
    Embedding(String),
}

/// Errors from session store operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error("session serialization error: {0}")]
    Serialization(String),
}
