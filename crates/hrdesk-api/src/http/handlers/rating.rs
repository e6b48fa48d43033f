//! Answer rating endpoint.
//!
//! Ratings are appended as JSON lines to `ratings.jsonl` in the data
//! directory; durable rating analytics are an external concern.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::io::AsyncWriteExt;

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub message: String,
    pub response: String,
    pub rating: i32,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub status: String,
    pub message: String,
}

/// POST /rate - record a rating for a question/answer pair.
pub async fn rate_response(
    State(state): State<AppState>,
    Json(request): Json<RatingRequest>,
) -> Result<Json<RatingResponse>, AppError> {
    if !(1..=5).contains(&request.rating) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let record = json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "message": request.message,
        "response": request.response,
        "rating": request.rating,
        "feedback": request.feedback,
    });

    let path = state.data_dir.join("ratings.jsonl");
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .map_err(|e| AppError::Internal(format!("failed to open ratings file: {e}")))?;
    file.write_all(format!("{record}\n").as_bytes())
        .await
        .map_err(|e| AppError::Internal(format!("failed to write rating: {e}")))?;

    Ok(Json(RatingResponse {
        status: "success".to_string(),
        message: "Rating submitted successfully".to_string(),
    }))
}
