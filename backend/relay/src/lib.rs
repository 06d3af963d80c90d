//! Streaming reply relay.
//!
//! The [`producer`] opens an incremental completion and forwards chunks over
//! the reply channel; the [`consumer`] folds them into a display. A
//! [`ChatSession`] ties both to one conversation and its uploads.

pub mod consumer;
pub mod producer;
pub mod session;
pub mod upload;

pub use consumer::consume_reply;
pub use producer::{RelayOutcome, ReplyProducer, relay};
pub use session::ChatSession;
pub use upload::{UploadOutcome, upload_media};
