use std::time::Duration;

use crate::{context::OpContext, state::AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

// Health check endpoint - lightweight, never touches the store
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// Readiness probe: pings the store under a 5s deadline
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let ctx = OpContext::with_timeout(Duration::from_secs(5));
    match state.store.ping(&ctx).await {
        Ok(()) => (StatusCode::OK, "ready".to_string()),
        Err(e) if e.is_cancellation() => (StatusCode::SERVICE_UNAVAILABLE, "not ready: timeout".to_string()),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("not ready: {}", e)),
    }
}

// Metrics endpoint: returns JSON snapshot
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.get_snapshot())
}
