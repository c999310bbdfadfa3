//! Conversation turns and the transcript that orders them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A committed message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Turn {
    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
            timestamp: Some(Utc::now()),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
            timestamp: Some(Utc::now()),
        }
    }
}

/// Ordered sequence of turns sent to the endpoint as conversational context.
///
/// Only the session mutates a transcript; everything else reads it through
/// [`Transcript::turns`] or a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Copy of the current turns, optionally followed by one extra turn that
    /// has not been committed yet.
    pub fn snapshot_with(&self, pending: Option<Turn>) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(self.turns.len() + 1);
        turns.extend(self.turns.iter().cloned());
        turns.extend(pending);
        turns
    }

    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.turns.truncate(len);
    }

    pub(crate) fn clear(&mut self) {
        self.turns.clear();
    }
}
