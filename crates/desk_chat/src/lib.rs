//! # desk_chat - Support chat sessions for deskchat
//!
//! This crate provides the customer-support chat flow:
//! - An intake form that validates name, email and an optional request
//! - A chat session that relays user turns to an automation webhook
//! - Best-effort transcript logging to a hosted endpoint or a local file
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐ submit ┌──────────────┐  POST  ┌──────────────┐
//! │ Intake Form │───────▶│ Chat Session │───────▶│   Webhook    │
//! └─────────────┘        └──────┬───────┘◀───────└──────────────┘
//!                               │ reply or fallback
//!                               ▼
//!                       ┌───────────────┐
//!                       │  Transcript   │ (best effort)
//!                       └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use desk_chat::{ChatSession, DeskConfig, HttpWebhook, IntakeForm};
//!
//! # async fn run() -> desk_chat::ChatResult<()> {
//! let config = DeskConfig::load(None)?;
//! config.validate()?;
//!
//! let contact = IntakeForm::new()
//!     .name("Ana")
//!     .email("ana@ex.com")
//!     .submit()?;
//!
//! let webhook = Arc::new(HttpWebhook::from_config(&config.webhook)?);
//! let mut session = ChatSession::new(contact, config.session_options(), webhook);
//! session.start().await;
//! session.send("I need help with my order").await;
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod config;
pub mod error;
pub mod intake;
pub mod notify;
pub mod reply;
pub mod session;
pub mod transcript;
pub mod types;
pub mod webhook;

pub use compose::{ComposeAction, Composer, KeyInput};
pub use config::{DeskConfig, MessagesConfig, TranscriptConfig, WebhookConfig};
pub use error::{ChatError, ChatResult};
pub use intake::{is_valid_email, IntakeField, IntakeForm, ValidationErrors};
pub use notify::{Notice, Notifier, TracingNotifier};
pub use reply::ReplyField;
pub use session::{ChatSession, PendingTurn, SessionOptions};
pub use transcript::{
    sink_from_config, FanoutTranscriptSink, HttpTranscriptSink, JsonlTranscriptSink,
    TranscriptRecord, TranscriptSink,
};
pub use types::*;
pub use webhook::{HttpWebhook, Webhook, WebhookAction, WebhookPayload};
