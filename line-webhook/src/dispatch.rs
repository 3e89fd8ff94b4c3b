//! Event dispatch - routes each decoded event to its handler.
//!
//! Every event yields exactly one [`DispatchOutcome`]. Failures are recorded
//! per event and never stop the rest of the batch; the caller acknowledges
//! the batch regardless of what is recorded here.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use crate::event::{Event, ReplyToken, Source};
use crate::reply::{postback_reply, ReplyComposer, ReplyError, ReplySender, WELCOME_MESSAGE};

/// Default number of events dispatched concurrently within a batch.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Result of dispatching a single event.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The handler ran and any reply was delivered
    Handled,
    /// The handler ran but the reply could not be delivered
    HandledWithReplyError(ReplyError),
    /// No handler exists for this event kind
    SkippedNoHandler,
    /// The event's payload could not be interpreted
    MalformedPayload(serde_json::Error),
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled)
    }
}

/// Per-batch outcome counts, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub handled: usize,
    pub reply_errors: usize,
    pub skipped: usize,
    pub malformed: usize,
}

impl DispatchSummary {
    pub fn from_outcomes(outcomes: &[DispatchOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut acc, outcome| {
            match outcome {
                DispatchOutcome::Handled => acc.handled += 1,
                DispatchOutcome::HandledWithReplyError(_) => acc.reply_errors += 1,
                DispatchOutcome::SkippedNoHandler => acc.skipped += 1,
                DispatchOutcome::MalformedPayload(_) => acc.malformed += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.handled + self.reply_errors + self.skipped + self.malformed
    }
}

/// Routes events to handlers using injected reply capabilities.
#[derive(Clone)]
pub struct EventDispatcher {
    sender: Arc<dyn ReplySender>,
    composer: Arc<dyn ReplyComposer>,
    concurrency: usize,
}

impl EventDispatcher {
    pub fn new(sender: Arc<dyn ReplySender>, composer: Arc<dyn ReplyComposer>) -> Self {
        Self {
            sender,
            composer,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set how many events may be dispatched at once. Values below 1 are
    /// treated as 1 (sequential).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Dispatch a batch of events.
    ///
    /// Outcomes are returned in the same order as `events`. At most
    /// `concurrency` events are in flight at once and all of them have
    /// finished when this returns. Every reply must complete before
    /// `deadline`; replies still pending then are recorded as
    /// [`ReplyError::Timeout`].
    pub async fn dispatch(&self, events: Vec<Event>, deadline: Instant) -> Vec<DispatchOutcome> {
        if events.is_empty() {
            return Vec::new();
        }

        let limit = self.concurrency.min(events.len());

        stream::iter(events.into_iter().enumerate())
            .map(|(index, event)| self.dispatch_one(index, event, deadline))
            .buffered(limit)
            .collect()
            .await
    }

    /// Dispatch a single event to the handler for its kind.
    pub async fn dispatch_one(&self, index: usize, event: Event, deadline: Instant) -> DispatchOutcome {
        let kind = event.kind().to_string();
        let is_redelivery = event.meta().is_redelivery;

        let outcome = match event {
            Event::TextMessage {
                source,
                reply_token,
                text,
                ..
            } => self.handle_text(&source, &reply_token, &text, deadline).await,
            Event::Follow {
                source,
                reply_token,
                ..
            } => self.handle_follow(&source, &reply_token, deadline).await,
            Event::Unfollow { source, .. } => {
                info!(user_id = %source.user_id, "line_user_unfollowed");
                DispatchOutcome::Handled
            }
            Event::Postback {
                source,
                reply_token,
                data,
                ..
            } => self.handle_postback(&source, &reply_token, &data, deadline).await,
            Event::Other { .. } => DispatchOutcome::SkippedNoHandler,
        };

        match &outcome {
            DispatchOutcome::Handled => {
                info!(index = index, kind = %kind, is_redelivery = is_redelivery, "event_handled")
            }
            DispatchOutcome::HandledWithReplyError(e) => warn!(
                index = index,
                kind = %kind,
                is_redelivery = is_redelivery,
                error = %e,
                "event_reply_failed"
            ),
            DispatchOutcome::SkippedNoHandler => {
                info!(index = index, kind = %kind, "event_skipped_no_handler")
            }
            DispatchOutcome::MalformedPayload(e) => warn!(
                index = index,
                kind = %kind,
                error = %e,
                "event_payload_malformed"
            ),
        }

        outcome
    }

    async fn handle_text(
        &self,
        source: &Source,
        reply_token: &ReplyToken,
        text: &str,
        deadline: Instant,
    ) -> DispatchOutcome {
        info!(
            user_id = %source.user_id,
            text_length = text.len(),
            "line_text_message_received"
        );

        let reply = self.composer.compose(&source.user_id, text);
        self.reply(reply_token, &reply, deadline).await
    }

    async fn handle_follow(
        &self,
        source: &Source,
        reply_token: &ReplyToken,
        deadline: Instant,
    ) -> DispatchOutcome {
        info!(user_id = %source.user_id, "line_user_followed");
        self.reply(reply_token, WELCOME_MESSAGE, deadline).await
    }

    async fn handle_postback(
        &self,
        source: &Source,
        reply_token: &ReplyToken,
        data: &str,
        deadline: Instant,
    ) -> DispatchOutcome {
        info!(
            user_id = %source.user_id,
            data_length = data.len(),
            "line_postback_received"
        );

        let payload: Map<String, Value> = match serde_json::from_str(data) {
            Ok(payload) => payload,
            Err(e) => return DispatchOutcome::MalformedPayload(e),
        };

        let reply = postback_reply(&payload);
        self.reply(reply_token, &reply, deadline).await
    }

    /// Send a reply bounded by the batch deadline.
    async fn reply(&self, reply_token: &ReplyToken, message: &str, deadline: Instant) -> DispatchOutcome {
        let result = match timeout_at(deadline, self.sender.send(reply_token, message)).await {
            Ok(result) => result,
            Err(_) => Err(ReplyError::Timeout),
        };

        match result {
            Ok(()) => DispatchOutcome::Handled,
            Err(e) => DispatchOutcome::HandledWithReplyError(e),
        }
    }
}
