//! Chat Event Logger
//!
//! Structured relay and upload events, emitted under the `chat_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    ExchangeStarted {
        provider: String,
        history_len: usize,
    },
    ReplyCompleted {
        chunks: usize,
        chars: usize,
    },
    UpstreamFailed {
        error_msg: String,
        chunks_before_failure: usize,
    },
    UploadCompleted {
        file_name: String,
        url: String,
        bytes: usize,
    },
    UploadFailed {
        file_name: String,
        error_msg: String,
    },
}

impl ChatEvent {
    fn redacted(self) -> Self {
        match self {
            ChatEvent::UpstreamFailed {
                error_msg,
                chunks_before_failure,
            } => ChatEvent::UpstreamFailed {
                error_msg: redact_sensitive_data(&error_msg),
                chunks_before_failure,
            },
            ChatEvent::UploadCompleted {
                file_name,
                url,
                bytes,
            } => ChatEvent::UploadCompleted {
                file_name,
                url: redact_sensitive_data(&url),
                bytes,
            },
            ChatEvent::UploadFailed {
                file_name,
                error_msg,
            } => ChatEvent::UploadFailed {
                file_name,
                error_msg: redact_sensitive_data(&error_msg),
            },
            other => other,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub conversation_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ChatEvent,
}

impl EventLogEntry {
    pub fn new(conversation_id: &str, event: ChatEvent) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            timestamp: Utc::now(),
            event: event.redacted(),
        }
    }
}

pub struct EventLogger;

impl EventLogger {
    /// Redact and emit one chat event.
    pub fn log_event(conversation_id: &str, event: ChatEvent) {
        let entry = EventLogEntry::new(conversation_id, event);
        let payload = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: "chat_events", conversation_id = %entry.conversation_id, event = %payload, "Chat event");
    }
}
