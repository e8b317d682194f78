//! API layer for the prompt relay.
//!
//! This module contains the HTTP handlers, request/response models, the
//! upstream client helpers and plain-text streaming support.

pub mod disconnect;
pub mod handlers;
pub mod models;
pub mod streaming;
pub mod upstream;

use crate::core::{request_id_middleware, MetricsMiddleware};
use axum::{
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Re-export commonly used types
pub use handlers::{health, metrics_handler, relay_prompt, AppState};
pub use models::{HealthResponse, PromptRequest};
pub use streaming::{create_text_stream, fragment_stream, text_stream_response};
pub use upstream::create_http_client;

/// Build the application router.
///
/// `/health` and `/metrics` are served on GET; every other path, with any
/// method, goes to the relay handler, which enforces its own method check.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route("/", any(relay_prompt))
        .route("/*path", any(relay_prompt))
        .layer(axum::middleware::from_fn(MetricsMiddleware::track_metrics))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
