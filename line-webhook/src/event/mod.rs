//! Webhook event model and envelope decoding.
//!
//! ```text
//! raw body → decode_events → Vec<Event> → dispatcher
//! ```

pub mod decoder;
pub mod types;

pub use decoder::{decode_events, DecodeError};
pub use types::{Event, EventMeta, ReplyToken, Source};
