use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Lifecycle of the in-progress assistant reply.
///
/// `Pending → Streaming(partial) → Complete(final)`; `Pending` may complete
/// directly with an empty reply. Nothing leaves `Complete`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum ReplyState {
    #[default]
    Pending,
    Streaming(String),
    Complete(String),
}

impl ReplyState {
    /// Append a relayed chunk and return the accumulated text.
    pub fn push_chunk(&mut self, chunk: &str) -> Result<&str, ChatError> {
        match self {
            ReplyState::Complete(_) => {
                return Err(ChatError::InvalidTransition(
                    "chunk received after completion".into(),
                ))
            }
            ReplyState::Streaming(buf) => buf.push_str(chunk),
            ReplyState::Pending => *self = ReplyState::Streaming(chunk.to_owned()),
        }
        Ok(self.text())
    }

    /// Drop the partial reply and restart from `text`.
    pub fn reset(&mut self, text: &str) -> Result<&str, ChatError> {
        if self.is_complete() {
            return Err(ChatError::InvalidTransition(
                "reset received after completion".into(),
            ));
        }
        *self = ReplyState::Streaming(text.to_owned());
        Ok(self.text())
    }

    /// Seal the reply and return its final text.
    pub fn complete(&mut self) -> Result<&str, ChatError> {
        let text = match self {
            ReplyState::Complete(_) => {
                return Err(ChatError::InvalidTransition("reply already complete".into()))
            }
            ReplyState::Pending => String::new(),
            ReplyState::Streaming(buf) => std::mem::take(buf),
        };
        *self = ReplyState::Complete(text);
        Ok(self.text())
    }

    pub fn text(&self) -> &str {
        match self {
            ReplyState::Pending => "",
            ReplyState::Streaming(text) | ReplyState::Complete(text) => text,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ReplyState::Complete(_))
    }
}
