//! Conversation history: turns, sessions and the session store.

mod memory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use memory::InMemorySessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
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
}

/// Append-only, chronologically ordered turns of one conversation.
#[derive(Debug, Clone, Default)]
pub struct Session {
    id: String,
    turns: Vec<Turn>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            turns: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
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

    /// Appends the user turn followed by the assistant turn.
    pub fn record_exchange(&mut self, input: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(Turn::user(input));
        self.turns.push(Turn::assistant(answer));
    }
}

/// A session behind its own async lock. Holding the guard serializes every
/// request on that session.
pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

pub trait SessionStore: Send + Sync {
    /// Returns the live session for `session_id`, creating an empty one if
    /// none exists or the previous one expired.
    fn get_or_create(&self, session_id: &str) -> SessionHandle;

    /// Number of resident sessions, expired ones included until purged.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops idle sessions; returns how many were removed.
    fn purge_expired(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_exchange_appends_user_then_assistant() {
        let mut session = Session::new("s1");
        session.record_exchange("Q1", "A1");
        session.record_exchange("Q2", "A2");

        assert_eq!(session.id(), "s1");
        assert_eq!(
            session.turns(),
            &[
                Turn::user("Q1"),
                Turn::assistant("A1"),
                Turn::user("Q2"),
                Turn::assistant("A2"),
            ]
        );
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Turn::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
