//! Webhook envelope decoding.
//!
//! The envelope either decodes completely or not at all. Unknown event and
//! message types become [`Event::Other`] so new platform features never break
//! a batch. Payload contents such as postback data are not interpreted here.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::types::{Event, EventMeta, ReplyToken, Source};

/// Envelope-level decode failure. No events are produced when this occurs.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid webhook JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{event_type} event at index {index} is missing `{field}`")]
    MissingField {
        index: usize,
        event_type: String,
        field: &'static str,
    },
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    destination: Option<String>,
    events: Vec<WireEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    reply_token: Option<String>,
    #[serde(default)]
    source: Option<WireSource>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    webhook_event_id: Option<String>,
    #[serde(default)]
    delivery_context: Option<WireDeliveryContext>,
    #[serde(default)]
    message: Option<WireMessage>,
    #[serde(default)]
    postback: Option<WirePostback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSource {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    group_id: Option<String>,
    #[serde(default)]
    room_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDeliveryContext {
    #[serde(default)]
    is_redelivery: bool,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WirePostback {
    data: String,
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a raw webhook body into events, preserving source order.
///
/// `{"events":[]}` yields an empty vector; a body that does not match the
/// envelope schema yields a [`DecodeError`].
pub fn decode_events(body: &[u8]) -> Result<Vec<Event>, DecodeError> {
    let envelope: WireEnvelope = serde_json::from_slice(body)?;

    debug!(
        destination = ?envelope.destination,
        event_count = envelope.events.len(),
        "webhook_envelope_decoded"
    );

    envelope
        .events
        .into_iter()
        .enumerate()
        .map(|(index, wire)| convert(index, wire))
        .collect()
}

fn convert(index: usize, wire: WireEvent) -> Result<Event, DecodeError> {
    let meta = EventMeta {
        webhook_event_id: wire.webhook_event_id,
        timestamp: wire.timestamp,
        is_redelivery: wire
            .delivery_context
            .map(|c| c.is_redelivery)
            .unwrap_or(false),
    };

    let source = wire
        .source
        .map(|s| Source {
            user_id: s.user_id.unwrap_or_default(),
            group_id: s.group_id,
            room_id: s.room_id,
        })
        .unwrap_or_default();

    let missing = |field: &'static str| DecodeError::MissingField {
        index,
        event_type: wire.event_type.clone(),
        field,
    };

    let event = match wire.event_type.as_str() {
        "message" => {
            let message = wire.message.ok_or_else(|| missing("message"))?;
            if message.message_type != "text" {
                return Ok(Event::Other {
                    kind: format!("message.{}", message.message_type),
                    meta,
                });
            }
            Event::TextMessage {
                reply_token: reply_token(wire.reply_token).ok_or_else(|| missing("replyToken"))?,
                text: message.text.ok_or_else(|| missing("message.text"))?,
                source,
                meta,
            }
        }
        "follow" => Event::Follow {
            reply_token: reply_token(wire.reply_token).ok_or_else(|| missing("replyToken"))?,
            source,
            meta,
        },
        "unfollow" => Event::Unfollow { source, meta },
        "postback" => {
            let postback = wire.postback.ok_or_else(|| missing("postback"))?;
            Event::Postback {
                reply_token: reply_token(wire.reply_token).ok_or_else(|| missing("replyToken"))?,
                data: postback.data,
                source,
                meta,
            }
        }
        other => Event::Other {
            kind: other.to_string(),
            meta,
        },
    };

    Ok(event)
}

fn reply_token(raw: Option<String>) -> Option<ReplyToken> {
    raw.filter(|t| !t.is_empty()).map(ReplyToken::new)
}
