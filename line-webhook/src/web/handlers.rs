//! Webhook endpoint handlers.
//!
//! The webhook handler captures the raw body once and hands it to the
//! [`IngestionPipeline`]. The platform only ever sees batch-level success or
//! rejection; per-event failures are visible in logs alone.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::pipeline::{IngestionPipeline, RawRequest};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestionPipeline>,
}

impl AppState {
    pub fn new(pipeline: IngestionPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "LINE Bot Webhook Server is running",
    })
}

// =============================================================================
// LINE Webhook
// =============================================================================

/// Webhook acknowledgment.
#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

/// LINE webhook endpoint.
///
/// Returns 401 for a missing or invalid signature, 400 for an undecodable
/// envelope, and 200 `{"status":"ok"}` otherwise.
pub async fn line_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!(body_length = body.len(), "line_webhook_received");

    let request = RawRequest::new(headers, body);

    match state.pipeline.handle(&request).await {
        Ok(_report) => (StatusCode::OK, Json(WebhookResponse { status: "ok" })).into_response(),
        Err(e) => e.into_response(),
    }
}
