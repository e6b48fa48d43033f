//! System status endpoint.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

/// GET /system/status - live session count and corpus size.
pub async fn system_status(State(state): State<AppState>) -> Json<Value> {
    // Expired sessions are dropped before counting
    state.engine.sessions().sweep_expired();
    let corpus_fragments = state.corpus.count().await.unwrap_or(0);

    Json(json!({
        "status": "online",
        "active_sessions": state.engine.sessions().len(),
        "corpus_fragments": corpus_fragments,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
