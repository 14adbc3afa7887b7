//! Reply text extraction from webhook responses.
//!
//! The canonical contract is `{ "output": "<text>" }`. Older automation
//! flows answer with `{ "message": "<text>" }` or
//! `{ "message": { "value": "<text>" } }`; those shapes are still readable by
//! selecting the matching [`ReplyField`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChatError, ChatResult};

/// Which response field carries the agent's reply
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplyField {
    /// `output` (canonical)
    #[default]
    Output,
    /// `message` as a plain string
    Message,
    /// `message.value`
    #[serde(rename = "message.value", alias = "message_value")]
    MessageValue,
    /// First of `output`, `message`, `message.value` that holds text
    Any,
}

impl ReplyField {
    /// Read the reply text, or `None` when the field is absent, not a
    /// string, or blank.
    pub fn extract(&self, body: &Value) -> Option<String> {
        match self {
            Self::Output => text_at(body, &["output"]),
            Self::Message => text_at(body, &["message"]),
            Self::MessageValue => text_at(body, &["message", "value"]),
            Self::Any => [Self::Output, Self::Message, Self::MessageValue]
                .iter()
                .find_map(|field| field.extract(body)),
        }
    }

    /// Like [`extract`](Self::extract) but reports a malformed reply
    pub fn require(&self, body: &Value) -> ChatResult<String> {
        self.extract(body)
            .ok_or_else(|| ChatError::MalformedReply(format!("no text at `{}`", self)))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Output => "output",
            Self::Message => "message",
            Self::MessageValue => "message.value",
            Self::Any => "any",
        }
    }
}

fn text_at(body: &Value, path: &[&str]) -> Option<String> {
    let mut current = body;
    for key in path {
        current = current.get(key)?;
    }
    current
        .as_str()
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

impl fmt::Display for ReplyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplyField {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "output" => Ok(Self::Output),
            "message" => Ok(Self::Message),
            "message.value" | "message_value" => Ok(Self::MessageValue),
            "any" => Ok(Self::Any),
            other => Err(ChatError::Config(format!(
                "unknown reply field '{}', expected output, message, message.value or any",
                other
            ))),
        }
    }
}
