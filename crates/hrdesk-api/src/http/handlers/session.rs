//! Session inspection and deletion endpoints.

use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};

use crate::http::error::AppError;
use crate::state::AppState;

/// GET /sessions/{token} - inspect a session's history.
pub async fn get_session(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Value>, AppError> {
    match state.engine.sessions().snapshot(&token).await {
        Some(session) => Ok(Json(json!(session))),
        None => Err(AppError::NotFound("Session not found".to_string())),
    }
}

/// POST /sessions/{token}/clear - reset a session's history in place.
pub async fn clear_session(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Value>, AppError> {
    if state.engine.sessions().reset(&token).await {
        Ok(Json(json!({
            "status": "success",
            "message": "Session cleared",
        })))
    } else {
        Err(AppError::NotFound("Session not found".to_string()))
    }
}

/// DELETE /sessions/{token} - drop a session entirely.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Value>, AppError> {
    if state.engine.sessions().remove(&token) {
        Ok(Json(json!({
            "status": "success",
            "message": "Session deleted",
        })))
    } else {
        Err(AppError::NotFound("Session not found".to_string()))
    }
}
