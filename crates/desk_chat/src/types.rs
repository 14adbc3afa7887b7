//! Core types for support chat sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a chat session
pub type SessionId = String;

/// Generate a fresh session identifier
pub fn new_session_id() -> SessionId {
    uuid::Uuid::new_v4().to_string()
}

/// Validated contact details captured by the intake form.
///
/// Built only through [`crate::intake::IntakeForm::submit`], so a `Contact`
/// always carries a non-empty name and a well-shaped email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub email: String,
    /// What the user wants help with (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Agent,
}

impl Author {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
        }
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transcript entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// `<sessionId>:<seq>`, unique and sortable in generation order
    pub id: String,
    pub text: String,
    pub author: Author,
    #[serde(rename = "sentAt")]
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub(crate) fn new(session_id: &str, seq: u64, author: Author, text: impl Into<String>) -> Self {
        Self {
            id: format!("{}:{:06}", session_id, seq),
            text: text.into(),
            author,
            sent_at: Utc::now(),
        }
    }

    /// Line recorded by the transcript log: `<author>: <text>`
    pub fn log_line(&self) -> String {
        format!("{}: {}", self.author, self.text)
    }
}

/// Connection indicator shown next to the chat
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Initialize request has not completed yet
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}

/// Point-in-time copy of a session, for rendering or `--json` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    pub contact: Contact,
    #[serde(rename = "connectionState")]
    pub connection_state: ConnectionState,
    pub messages: Vec<ChatMessage>,
}
