//! Outbound replies.
//!
//! This module provides:
//! - The [`ReplySender`] capability the dispatcher sends replies through
//! - [`LineReplyClient`], the Messaging API implementation
//! - [`ReplyComposer`] and the default [`KeywordComposer`] for reply text

pub mod client;
pub mod compose;

use async_trait::async_trait;
use thiserror::Error;

use crate::event::ReplyToken;

pub use client::LineReplyClient;
pub use compose::{
    postback_reply, KeywordComposer, ReplyComposer, GREETING_MESSAGE, HELP_MESSAGE, WELCOME_MESSAGE,
};

/// Failure delivering a single reply.
#[derive(Debug, Error)]
pub enum ReplyError {
    /// The batch deadline elapsed before the reply was delivered.
    #[error("reply timed out")]
    Timeout,

    #[error("reply request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("reply rejected with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Free-form failure from a custom sender.
    #[error("{0}")]
    Other(String),
}

/// Capability to send one text reply for a reply token.
///
/// Implementations are shared across concurrent requests and must be safe
/// to call without external synchronization.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send(&self, reply_token: &ReplyToken, message: &str) -> Result<(), ReplyError>;
}
