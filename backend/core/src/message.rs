use std::fmt;

use serde::{Deserialize, Serialize};

/// Replaces the reply when the text-generation service fails.
pub const DEFAULT_FALLBACK_TEXT: &str = "Sorry, there was an error getting a response.";

/// Shown when an exchange could not be started at all.
pub const SEND_FAILED_TEXT: &str = "Sorry, there was an error. Please try again.";

/// Shown when the media store rejects an upload.
pub const UPLOAD_FAILED_TEXT: &str = "File upload failed. Please try again.";

/// Who authored a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// The user message recorded after a successful upload.
    pub fn uploaded_file(name: &str, url: &str) -> Self {
        Self::user(format!("Uploaded file: [{name}]({url})"))
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}
