//! Axum router configuration with middleware.
//!
//! Routes mirror the caller-facing surface: chat, session management,
//! rating, and status. Middleware: CORS and request tracing. The external
//! layer owns authentication and rate limiting.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/new-session", post(handlers::chat::new_session))
        .route("/rate", post(handlers::rating::rate_response))
        .route("/system/status", get(handlers::status::system_status))
        .route(
            "/sessions/{token}",
            get(handlers::session::get_session).delete(handlers::session::delete_session),
        )
        .route("/sessions/{token}/clear", post(handlers::session::clear_session))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
