//! Conversation transcript sent to the model
//!
//! A conversation only grows at the tail, and a turn cannot be edited once it
//! has been appended. Each logical exchange builds its own conversation.

use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One text part of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A single turn: a role plus its ordered parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    parts: Vec<Part>,
}

impl Turn {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// All parts joined by a blank line, for backends that take one string per message
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Ordered, append-only list of turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation with a single user turn
    pub fn from_user(text: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.push_user(text);
        conversation
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Role::User, vec![Part::text(text)])
    }

    pub fn push_model(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Role::Model, vec![Part::text(text)])
    }

    /// Append one user turn made of several parts
    pub fn push_user_parts<I, S>(&mut self, parts: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts = parts.into_iter().map(Part::text).collect();
        self.push(Role::User, parts)
    }

    fn push(&mut self, role: Role, parts: Vec<Part>) -> &mut Self {
        self.turns.push(Turn { role, parts });
        self
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
}
