//! Error types shared across the ingestion pipeline.
//!
//! Only request-terminal errors live here. Per-event failures are carried in
//! [`DispatchOutcome`](crate::dispatch::DispatchOutcome) and never reach the
//! HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::event::DecodeError;

/// Startup configuration failure. Fatal: the server must not start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set and non-empty")]
    Missing(&'static str),
}

/// Request-level failure returned by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Signature header missing or not matching the body.
    ///
    /// Both cases render identically so callers cannot tell them apart.
    #[error("request signature missing or invalid")]
    Unauthenticated,

    /// The batch envelope could not be decoded.
    #[error("malformed webhook envelope: {0}")]
    MalformedEnvelope(#[from] DecodeError),
}

/// Error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let (code, body) = match self {
            IngestError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    status: "unauthorized",
                    message: "invalid signature",
                },
            ),
            IngestError::MalformedEnvelope(_) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    status: "bad_request",
                    message: "failed to parse request",
                },
            ),
        };

        (code, Json(body)).into_response()
    }
}
