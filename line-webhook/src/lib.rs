//! LINE webhook receiver.
//!
//! Authenticates inbound LINE Messaging API webhooks, decodes their event
//! batches and dispatches each event to a reply handler.
//!
//! ## Architecture
//!
//! ```text
//! POST /webhook → signature gate → decode_events → EventDispatcher → 200 ack
//!                                                        ↓
//!                                                  ReplySender (LINE API)
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod reply;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{DispatchOutcome, DispatchSummary, EventDispatcher};
pub use error::{ConfigError, IngestError};
pub use event::{decode_events, DecodeError, Event};
pub use pipeline::{BatchReport, IngestionPipeline, RawRequest};
pub use reply::{KeywordComposer, LineReplyClient, ReplyComposer, ReplyError, ReplySender};
pub use web::AppState;
