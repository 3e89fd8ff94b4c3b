//! Typed webhook events.
//!
//! Events are the decoded, validated form of the platform's wire payloads.
//! Every event kind the dispatcher understands is a variant of [`Event`];
//! anything else lands in [`Event::Other`].

/// Where an event came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Source {
    /// Sending user. Empty when the platform withholds it (e.g. some group events).
    pub user_id: String,
    /// Group chat identifier, if the event happened in a group
    pub group_id: Option<String>,
    /// Multi-person room identifier, if the event happened in a room
    pub room_id: Option<String>,
}

/// Single-use token permitting one reply to an event.
#[derive(Clone, PartialEq, Eq)]
pub struct ReplyToken(String);

impl ReplyToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials for a single reply; keep them out of logs.
impl std::fmt::Debug for ReplyToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReplyToken(<REDACTED>)")
    }
}

/// Delivery metadata attached to every event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMeta {
    /// Platform-assigned event identifier
    pub webhook_event_id: Option<String>,
    /// Event time in milliseconds since the epoch
    pub timestamp: Option<i64>,
    /// Whether the platform is redelivering this event
    pub is_redelivery: bool,
}

/// A decoded webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A text message sent by a user
    TextMessage {
        source: Source,
        reply_token: ReplyToken,
        text: String,
        meta: EventMeta,
    },
    /// The bot was added as a friend or unblocked
    Follow {
        source: Source,
        reply_token: ReplyToken,
        meta: EventMeta,
    },
    /// The bot was blocked. No reply is possible.
    Unfollow { source: Source, meta: EventMeta },
    /// A user triggered a postback action
    Postback {
        source: Source,
        reply_token: ReplyToken,
        /// Application-defined payload, opaque until interpreted
        data: String,
        meta: EventMeta,
    },
    /// Any event or message kind without a handler
    Other { kind: String, meta: EventMeta },
}

impl Event {
    /// Short label used in logs.
    pub fn kind(&self) -> &str {
        match self {
            Event::TextMessage { .. } => "text_message",
            Event::Follow { .. } => "follow",
            Event::Unfollow { .. } => "unfollow",
            Event::Postback { .. } => "postback",
            Event::Other { kind, .. } => kind.as_str(),
        }
    }

    pub fn meta(&self) -> &EventMeta {
        match self {
            Event::TextMessage { meta, .. }
            | Event::Follow { meta, .. }
            | Event::Unfollow { meta, .. }
            | Event::Postback { meta, .. }
            | Event::Other { meta, .. } => meta,
        }
    }

    /// Source of the event, if the variant carries one.
    pub fn source(&self) -> Option<&Source> {
        match self {
            Event::TextMessage { source, .. }
            | Event::Follow { source, .. }
            | Event::Unfollow { source, .. }
            | Event::Postback { source, .. } => Some(source),
            Event::Other { .. } => None,
        }
    }
}
