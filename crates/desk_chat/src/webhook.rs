//! Client for the external automation webhook.
//!
//! Every request is a JSON POST carrying the session id, an action
//! discriminator and the contact fields. The response body is returned as
//! raw JSON; picking the reply text out of it is the session's job (see
//! [`crate::reply::ReplyField`]).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::WebhookConfig;
use crate::error::{ChatError, ChatResult};
use crate::types::{Contact, SessionId};

#[cfg(test)]
use mockall::automock;

/// Kind of event delivered to the webhook
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookAction {
    InitializeChat,
    SendMessage,
}

/// Request body posted to the webhook
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookPayload {
    pub action: WebhookAction,
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    /// User text, present for `send_message` only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl WebhookPayload {
    pub fn initialize(session_id: &str, contact: &Contact) -> Self {
        Self::build(WebhookAction::InitializeChat, session_id, contact, None)
    }

    pub fn send_message(session_id: &str, contact: &Contact, text: impl Into<String>) -> Self {
        Self::build(
            WebhookAction::SendMessage,
            session_id,
            contact,
            Some(text.into()),
        )
    }

    fn build(
        action: WebhookAction,
        session_id: &str,
        contact: &Contact,
        message: Option<String>,
    ) -> Self {
        Self {
            action,
            session_id: session_id.to_string(),
            name: contact.name.clone(),
            email: contact.email.clone(),
            request: contact.request.clone(),
            message,
            timestamp: Utc::now(),
        }
    }
}

/// Anything that can deliver a payload and hand back the JSON reply
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Webhook: Send + Sync {
    async fn post(&self, payload: &WebhookPayload) -> ChatResult<Value>;
}

/// Webhook reached over HTTP with `reqwest`
pub struct HttpWebhook {
    url: String,
    client: reqwest::Client,
}

impl HttpWebhook {
    /// Create a client for `url` with a per-request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> ChatResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn from_config(config: &WebhookConfig) -> ChatResult<Self> {
        Self::new(config.url.clone(), config.timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Webhook for HttpWebhook {
    async fn post(&self, payload: &WebhookPayload) -> ChatResult<Value> {
        tracing::debug!(
            action = ?payload.action,
            session_id = %payload.session_id,
            "Posting to webhook"
        );

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ChatError::WebhookStatus {
                status: status.as_u16(),
                body,
            });
        }

        // Some flows answer 200 with an empty body when they have nothing to say
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body)
            .map_err(|e| ChatError::MalformedReply(format!("response is not JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> Contact {
        Contact {
            name: "Ana".to_string(),
            email: "ana@ex.com".to_string(),
            request: None,
        }
    }

    #[test]
    fn test_initialize_payload_shape() {
        let payload = WebhookPayload::initialize("s-1", &contact());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["action"], "initialize_chat");
        assert_eq!(json["sessionId"], "s-1");
        assert_eq!(json["name"], "Ana");
        assert_eq!(json["email"], "ana@ex.com");
        assert!(json.get("message").is_none());
        assert!(json.get("request").is_none());
    }

    #[test]
    fn test_send_payload_carries_text_and_request() {
        let mut contact = contact();
        contact.request = Some("refund".to_string());

        let payload = WebhookPayload::send_message("s-1", &contact, "help");
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["action"], "send_message");
        assert_eq!(json["message"], "help");
        assert_eq!(json["request"], "refund");
    }

    #[test]
    fn test_http_webhook_keeps_url() {
        let hook = HttpWebhook::new("http://localhost:5678/webhook", Duration::from_secs(5)).unwrap();
        assert_eq!(hook.url(), "http://localhost:5678/webhook");
    }
}
