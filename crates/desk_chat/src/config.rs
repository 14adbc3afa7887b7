//! Configuration for chat sessions.
//!
//! Values are layered: built-in defaults, then an optional config file
//! (`.toml`, `.yaml` or `.yml`), then `DESKCHAT_*` environment variables.
//! Command-line flags are applied on top by the binary.
//!
//! ```toml
//! [webhook]
//! url = "https://automation.example.com/webhook/support"
//! timeout_secs = 30
//! reply_field = "output"
//!
//! [transcript]
//! enabled = true
//! endpoint = "https://db.example.com/rest/v1/chat_logs"
//!
//! [messages]
//! greeting = "Hi {name}! Thanks for reaching out."
//! ```

use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ChatResult};
use crate::reply::ReplyField;
use crate::session::SessionOptions;

pub const DEFAULT_GREETING: &str =
    "Hi {name}! Thanks for reaching out. An agent will be with you shortly.";
pub const DEFAULT_FALLBACK: &str =
    "Sorry, we're experiencing a technical difficulty. Please try again in a moment.";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub transcript: TranscriptConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
}

/// Automation webhook settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Endpoint receiving `initialize_chat` and `send_message` events
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Where the reply text lives in the response body
    #[serde(default)]
    pub reply_field: ReplyField,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            reply_field: ReplyField::default(),
        }
    }
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Best-effort transcript logging
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptConfig {
    #[serde(default)]
    pub enabled: bool,
    /// HTTP endpoint accepting `{sessionId, message}` records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Sent as `apikey` and bearer token when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Local JSON lines file, used in addition to or instead of the endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Canned texts shown by the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesConfig {
    /// Greeting template, `{name}` is replaced by the contact's name
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK.to_string()
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            fallback: default_fallback(),
        }
    }
}

impl DeskConfig {
    /// Load a config file, picking the format from its extension
    pub fn from_file(path: impl AsRef<Path>) -> ChatResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            _ => Err(ChatError::Config(format!(
                "unsupported config format: {} (use .toml, .yaml or .yml)",
                path.display()
            ))),
        }
    }

    /// Defaults, then the file if given, then the process environment
    pub fn load(path: Option<&Path>) -> ChatResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply `DESKCHAT_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; unparsable values are ignored
    /// with a warning.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DESKCHAT_WEBHOOK_URL") {
            self.webhook.url = url;
        }

        if let Some(timeout) = lookup("DESKCHAT_WEBHOOK_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.webhook.timeout_secs = secs,
                Err(_) => tracing::warn!(value = %timeout, "Ignoring invalid DESKCHAT_WEBHOOK_TIMEOUT_SECS"),
            }
        }

        if let Some(field) = lookup("DESKCHAT_REPLY_FIELD") {
            match field.parse::<ReplyField>() {
                Ok(field) => self.webhook.reply_field = field,
                Err(e) => tracing::warn!("Ignoring DESKCHAT_REPLY_FIELD: {}", e),
            }
        }

        if let Some(endpoint) = lookup("DESKCHAT_TRANSCRIPT_ENDPOINT") {
            self.transcript.endpoint = Some(endpoint);
        }

        if let Some(key) = lookup("DESKCHAT_TRANSCRIPT_API_KEY") {
            self.transcript.api_key = Some(key);
        }

        if let Some(enabled) = lookup("DESKCHAT_TRANSCRIPT_ENABLED") {
            match parse_bool(&enabled) {
                Some(flag) => self.transcript.enabled = flag,
                None => tracing::warn!(value = %enabled, "Ignoring invalid DESKCHAT_TRANSCRIPT_ENABLED"),
            }
        }
    }

    /// Check the configuration is usable for a session
    pub fn validate(&self) -> ChatResult<()> {
        if self.webhook.url.trim().is_empty() {
            return Err(ChatError::Config(
                "webhook url is required (set webhook.url or DESKCHAT_WEBHOOK_URL)".to_string(),
            ));
        }
        check_http_url("webhook url", &self.webhook.url)?;

        if self.webhook.timeout_secs == 0 {
            return Err(ChatError::Config(
                "webhook timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.transcript.enabled {
            match (&self.transcript.endpoint, &self.transcript.file) {
                (None, None) => {
                    return Err(ChatError::Config(
                        "transcript logging is enabled but neither endpoint nor file is set"
                            .to_string(),
                    ))
                }
                (Some(endpoint), _) => check_http_url("transcript endpoint", endpoint)?,
                _ => {}
            }
        }

        Ok(())
    }

    /// Session texts and reply strategy derived from this config
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            greeting: self.messages.greeting.clone(),
            fallback: self.messages.fallback.clone(),
            reply_field: self.webhook.reply_field,
        }
    }

    /// Render as TOML, used to write sample config files
    pub fn to_toml(&self) -> ChatResult<String> {
        toml::to_string_pretty(self).map_err(|e| ChatError::Config(e.to_string()))
    }
}

fn check_http_url(what: &str, value: &str) -> ChatResult<()> {
    let url = Url::parse(value)
        .map_err(|e| ChatError::Config(format!("{} '{}' is not a valid URL: {}", what, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ChatError::Config(format!(
            "{} must use http or https, got '{}'",
            what, scheme
        ))),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
