//! Messaging API reply client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use super::{ReplyError, ReplySender};
use crate::event::ReplyToken;

/// Path of the reply endpoint relative to the API base URL.
const REPLY_PATH: &str = "/v2/bot/message/reply";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    message_type: &'static str,
    text: &'a str,
}

/// Sends replies through the LINE Messaging API.
///
/// Cheap to clone; the underlying `reqwest::Client` pools connections and is
/// shared between clones.
#[derive(Clone)]
pub struct LineReplyClient {
    client: Client,
    endpoint: String,
    access_token: String,
}

impl LineReplyClient {
    /// Create a client for `api_base_url` (e.g. `https://api.line.me`).
    ///
    /// `request_timeout` caps each HTTP call independently of the batch
    /// deadline enforced by the dispatcher.
    pub fn new(
        api_base_url: &str,
        access_token: String,
        request_timeout: Duration,
    ) -> Result<Self, ReplyError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .pool_max_idle_per_host(16)
            .build()
            .map_err(ReplyError::Http)?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", api_base_url.trim_end_matches('/'), REPLY_PATH),
            access_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for LineReplyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineReplyClient")
            .field("endpoint", &self.endpoint)
            .field("access_token", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl ReplySender for LineReplyClient {
    async fn send(&self, reply_token: &ReplyToken, message: &str) -> Result<(), ReplyError> {
        let payload = ReplyRequest {
            reply_token: reply_token.as_str(),
            messages: [TextMessage {
                message_type: "text",
                text: message,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!(error = %e, "line_reply_timeout");
                    ReplyError::Timeout
                } else {
                    error!(error = %e, "line_reply_request_error");
                    ReplyError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status_code = status.as_u16(),
                body_length = body.len(),
                "line_reply_rejected"
            );
            return Err(ReplyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            status_code = status.as_u16(),
            message_length = message.len(),
            "line_reply_sent"
        );

        Ok(())
    }
}
