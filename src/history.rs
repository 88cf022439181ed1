//! Rolling chat history
//!
//! A fixed-capacity window of role-tagged messages used to build
//! conversational context. Pure in-memory bookkeeping; callers that share
//! one history across concurrent queries wrap it in
//! `Arc<tokio::sync::Mutex<ChatHistory>>`.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

/// A single role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Fixed-size sliding window over the conversation
///
/// Holds at most `2 * size` messages (one user and one assistant turn per
/// exchange). Appending past the bound silently discards the oldest
/// messages; overflow is never an error.
#[derive(Debug, Clone)]
pub struct ChatHistory {
    size: usize,
    buffer: VecDeque<ChatMessage>,
}

impl ChatHistory {
    /// Create a history retaining `size` exchanges
    pub fn new(size: usize) -> Self {
        Self {
            size,
            buffer: VecDeque::with_capacity(2 * size),
        }
    }

    /// Push a message to the back of the window
    pub fn append(&mut self, message: ChatMessage) {
        self.buffer.push_back(message);
        while self.buffer.len() > 2 * self.size {
            self.buffer.pop_front();
        }
    }

    /// Snapshot of the window in insertion order, oldest first
    pub fn to_vec(&self) -> Vec<ChatMessage> {
        self.buffer.iter().cloned().collect()
    }

    /// Number of messages currently retained
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the window is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Render the window as `Role: content` lines, oldest first
    ///
    /// Used when building the contextualized query sent to an engine.
    pub fn transcript(&self) -> String {
        self.buffer
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
