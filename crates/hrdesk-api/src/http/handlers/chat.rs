//! Chat and session-creation endpoints.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hrdesk_types::answer::Confidence;

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub is_new_session: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_token: String,
    pub is_new_session: bool,
    pub sources: Vec<String>,
    pub confidence: Confidence,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_token: String,
    pub message: String,
}

/// POST /chat - answer one message within a session.
///
/// A missing, unknown, or explicitly refreshed token starts a new session.
/// The engine call runs on a spawned task so a client disconnect cannot
/// abandon the turn before history is finalized.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }

    let (session_token, is_new_session) = match request.session_token {
        Some(token)
            if !request.is_new_session
                && state.engine.sessions().snapshot(&token).await.is_some() =>
        {
            (token, false)
        }
        _ => (Uuid::now_v7().to_string(), true),
    };

    let engine = state.engine.clone();
    let message = request.message;
    let token_for_task = session_token.clone();
    let answer = tokio::spawn(async move { engine.handle(&token_for_task, &message).await })
        .await
        .map_err(|e| AppError::Internal(format!("engine task failed: {e}")))?;

    Ok(Json(ChatResponse {
        response: answer.text,
        session_token,
        is_new_session,
        sources: answer.sources,
        confidence: answer.confidence,
    }))
}

/// POST /new-session - create an empty session up front.
pub async fn new_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session_token = Uuid::now_v7().to_string();
    state.engine.sessions().checkout(&session_token);

    Json(SessionResponse {
        session_token,
        message: "New session created successfully".to_string(),
    })
}
