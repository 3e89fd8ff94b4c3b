//! Webhook ingestion pipeline.
//!
//! ```text
//! RawRequest → signature gate → decode_events → EventDispatcher → BatchReport
//! ```
//!
//! The body is captured once and both verified and decoded from the same
//! bytes.

use std::fmt;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::HeaderMap;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::dispatch::{DispatchOutcome, DispatchSummary, EventDispatcher};
use crate::error::{ConfigError, IngestError};
use crate::event::decode_events;
use crate::web::signature::{signature_from_headers, verify_signature};

/// An inbound webhook request with its body fully captured.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawRequest {
    pub fn new(headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }
}

/// Per-event outcomes of an accepted batch.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<DispatchOutcome>,
    pub summary: DispatchSummary,
}

/// Authenticates, decodes and dispatches webhook batches.
pub struct IngestionPipeline {
    channel_secret: Vec<u8>,
    dispatcher: EventDispatcher,
    reply_budget: Duration,
}

impl IngestionPipeline {
    /// Build a pipeline. The channel secret must be non-empty.
    ///
    /// `reply_budget` bounds the time spent sending all replies of one batch.
    pub fn new(
        channel_secret: impl Into<String>,
        dispatcher: EventDispatcher,
        reply_budget: Duration,
    ) -> Result<Self, ConfigError> {
        let channel_secret = channel_secret.into();
        if channel_secret.trim().is_empty() {
            return Err(ConfigError::Missing("LINE_CHANNEL_SECRET"));
        }

        Ok(Self {
            channel_secret: channel_secret.into_bytes(),
            dispatcher,
            reply_budget,
        })
    }

    /// Handle one webhook request.
    ///
    /// Returns an error only for authentication or envelope failures. Once a
    /// batch is accepted, per-event failures are reported in the
    /// [`BatchReport`] and never turn into an error.
    pub async fn handle(&self, request: &RawRequest) -> Result<BatchReport, IngestError> {
        let deadline = Instant::now() + self.reply_budget;

        let signature = match signature_from_headers(&request.headers) {
            Some(sig) => sig,
            None => {
                warn!(body_length = request.body.len(), "webhook_signature_missing");
                return Err(IngestError::Unauthenticated);
            }
        };

        if !verify_signature(&request.body, &self.channel_secret, signature) {
            warn!(body_length = request.body.len(), "webhook_signature_invalid");
            return Err(IngestError::Unauthenticated);
        }

        let events = decode_events(&request.body).map_err(|e| {
            warn!(error = %e, body_length = request.body.len(), "webhook_decode_failed");
            IngestError::from(e)
        })?;

        info!(event_count = events.len(), "webhook_batch_received");

        let outcomes = self.dispatcher.dispatch(events, deadline).await;
        let summary = DispatchSummary::from_outcomes(&outcomes);

        info!(
            event_count = summary.total(),
            handled = summary.handled,
            reply_errors = summary.reply_errors,
            skipped = summary.skipped,
            malformed = summary.malformed,
            "webhook_batch_dispatched"
        );

        Ok(BatchReport { outcomes, summary })
    }
}

impl fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("channel_secret", &"<REDACTED>")
            .field("reply_budget", &self.reply_budget)
            .finish()
    }
}
