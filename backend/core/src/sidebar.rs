//! Sidebar of conversations.
//!
//! Every operation is a synchronous state transition; a failed operation
//! leaves the sidebar untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ChatError;

const DEFAULT_TITLE: &str = "New chat";

/// One entry in the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub title: String,
    pub last_message: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ConversationRecord {
    fn new(title: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: normalize_title(title),
            last_message: String::new(),
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    /// Up to two upper-cased initials, shown when there is no avatar.
    pub fn initials(&self) -> String {
        self.title
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

fn normalize_title(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title.to_string()
    }
}

/// Conversation list plus the current selection.
#[derive(Debug, Clone, Default)]
pub struct Sidebar {
    records: Vec<ConversationRecord>,
    active_id: Option<String>,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a conversation and return its id. The new record is not selected.
    pub fn create(&mut self, title: &str) -> String {
        let record = ConversationRecord::new(title);
        let id = record.id.clone();
        debug!(id = %id, title = %record.title, "Conversation created");
        self.records.push(record);
        id
    }

    pub fn rename(&mut self, id: &str, title: &str) -> Result<(), ChatError> {
        let record = self.get_mut(id)?;
        record.title = normalize_title(title);
        Ok(())
    }

    /// Remove a conversation; clears the selection if it pointed here.
    pub fn delete(&mut self, id: &str) -> Result<ConversationRecord, ChatError> {
        let index = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))?;
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        Ok(self.records.remove(index))
    }

    pub fn select(&mut self, id: &str) -> Result<(), ChatError> {
        self.get(id)?;
        self.active_id = Some(id.to_string());
        Ok(())
    }

    /// Update the preview line of a conversation.
    pub fn touch(&mut self, id: &str, last_message: &str) -> Result<(), ChatError> {
        let record = self.get_mut(id)?;
        record.last_message = last_message.to_string();
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&ConversationRecord, ChatError> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut ConversationRecord, ChatError> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))
    }

    /// Most recently created first.
    pub fn list(&self) -> Vec<&ConversationRecord> {
        self.records.iter().rev().collect()
    }

    pub fn active(&self) -> Option<&ConversationRecord> {
        let id = self.active_id.as_deref()?;
        self.records.iter().find(|r| r.id == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
