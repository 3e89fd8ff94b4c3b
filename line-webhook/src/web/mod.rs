//! Web server module for handling inbound webhooks.
//!
//! This module provides the HTTP surface:
//! - `POST /webhook` receives signed LINE webhook batches
//! - `GET /health` reports liveness

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use handlers::{health, line_webhook, AppState, HealthResponse, WebhookResponse};
pub use signature::{compute_signature, verify_signature, SIGNATURE_HEADER};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(line_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
