use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::message::Message;
use crate::traits::ReplyDisplay;

/// Ordered, append-only chat history.
///
/// `revision` increases on every append and every replacement of the
/// in-progress reply, so a view can tell when it needs to re-render.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
    revision: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            revision: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.revision += 1;
    }
}

impl ReplyDisplay for Conversation {
    fn append_message(&mut self, message: Message) {
        self.push(message);
    }

    fn replace_last_message(&mut self, content: String) {
        match self.messages.last_mut() {
            Some(last) => *last = Message::assistant(content),
            None => self.messages.push(Message::assistant(content)),
        }
        self.revision += 1;
    }
}

/// A history is submittable when it is non-empty and ends with a user turn.
pub fn validate_history(history: &[Message]) -> Result<(), ChatError> {
    match history.last() {
        None => Err(ChatError::InvalidHistory("history is empty".into())),
        Some(last) if !last.is_user() => Err(ChatError::InvalidHistory(format!(
            "last message must come from the user, got {}",
            last.role
        ))),
        Some(_) => Ok(()),
    }
}
