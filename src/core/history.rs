//! Conversation history.

use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person rehearsing.
    User,
    /// The model acting as interviewer.
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Author of the message.
    pub role: Role,
    /// Message text.
    pub text: String,
}

impl Turn {
    /// Creates a user turn.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Creates an assistant turn.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Ordered, append-only sequence of turns.
///
/// Turns are only ever added in user/assistant pairs, so a history never
/// ends with an unanswered user message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Appends a completed exchange: the user message, then the reply.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(Turn::user(user));
        self.turns.push(Turn::assistant(assistant));
    }

    /// Returns all turns in order.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the turns of the most recent `exchanges` user/assistant
    /// pairs, in order.
    #[must_use]
    pub fn window(&self, exchanges: usize) -> &[Turn] {
        let start = self
            .turns
            .len()
            .saturating_sub(exchanges.saturating_mul(2));
        &self.turns[start..]
    }

    /// Number of turns.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if no turns have been recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drops all turns.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Returns the last assistant message, if any.
    #[must_use]
    pub fn last_reply(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.text.as_str())
    }
}
