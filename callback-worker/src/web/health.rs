//! Health endpoint handlers.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// Router exposing `GET /health`; other methods get `405 Method Not Allowed`.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}
