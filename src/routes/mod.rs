//! HTTP route handlers for the favorites API.
//!
//! - `favorites`: list, add, remove and re-describe a user's favorites
//! - `batch`: concurrent multi-asset add
//! - `health`: liveness, readiness and metrics endpoints

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod batch;
pub mod favorites;
pub mod health;

/// Builds the application router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .route(
            "/favorites/{user_id}",
            get(favorites::get_favorites).post(favorites::add_favorite),
        )
        .route("/multiple/favorites/{user_id}", post(batch::add_multiple_favorites))
        .route(
            "/favorites/{user_id}/{asset_id}",
            put(favorites::update_description).delete(favorites::remove_favorite),
        )
        .with_state(state)
        // Global body limit (10 MB)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
}
