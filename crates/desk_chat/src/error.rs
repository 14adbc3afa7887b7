//! Error types for the chat system.

use thiserror::Error;

use crate::intake::ValidationErrors;

/// Chat system errors
#[derive(Error, Debug)]
pub enum ChatError {
    /// Intake form rejected one or more fields
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Request could not be sent or the connection dropped
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Webhook answered with a non-success status
    #[error("Webhook returned {status}: {body}")]
    WebhookStatus { status: u16, body: String },

    /// Webhook answered but no usable reply text could be read
    #[error("Malformed webhook reply: {0}")]
    MalformedReply(String),

    /// Transcript logging failed
    #[error("Transcript error: {0}")]
    Transcript(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ChatError {
    /// Errors that mean the external reply could not be obtained.
    ///
    /// These are recovered inside the session by the fallback message and a
    /// disconnected indicator.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::WebhookStatus { .. } | Self::MalformedReply(_)
        )
    }
}

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;
