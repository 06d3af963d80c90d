//! Telemetry and structured logging for chatrelay.
//!
//! Console and rolling NDJSON output, secret redaction, and the chat event log.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{ChatEvent, EventLogEntry, EventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
