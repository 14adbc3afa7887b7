//! Chat session: transcript, connection indicator and the webhook exchange.
//!
//! A session starts by appending a local greeting and sending an
//! `initialize_chat` event. Each user turn is appended optimistically, sent
//! as `send_message`, and answered either by the webhook's reply or by a
//! fixed fallback text. The transcript is append-only and is the single
//! source of truth for display order.
//!
//! Turns are split into a `begin_*` step (needs `&mut self`, appends and
//! builds the payload) and [`ChatSession::finish_turn`] (applies the
//! outcome). Callers that want several requests in flight can post the
//! payloads themselves and finish them in whatever order they complete.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinSet;

use crate::config::{DEFAULT_FALLBACK, DEFAULT_GREETING};
use crate::error::ChatResult;
use crate::notify::{Notice, Notifier, TracingNotifier};
use crate::reply::ReplyField;
use crate::transcript::{TranscriptRecord, TranscriptSink};
use crate::types::{
    new_session_id, Author, ChatMessage, ConnectionState, Contact, SessionId, SessionSnapshot,
};
use crate::webhook::{Webhook, WebhookAction, WebhookPayload};

/// Texts and reply strategy for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Greeting template, `{name}` is replaced by the contact's name
    pub greeting: String,
    pub fallback: String,
    pub reply_field: ReplyField,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            fallback: DEFAULT_FALLBACK.to_string(),
            reply_field: ReplyField::default(),
        }
    }
}

/// A request that has been recorded locally but not yet answered
#[derive(Debug, Clone)]
pub struct PendingTurn {
    payload: WebhookPayload,
}

impl PendingTurn {
    pub fn payload(&self) -> &WebhookPayload {
        &self.payload
    }

    pub fn is_initialize(&self) -> bool {
        self.payload.action == WebhookAction::InitializeChat
    }
}

/// One support conversation
pub struct ChatSession {
    id: SessionId,
    contact: Contact,
    options: SessionOptions,
    messages: Vec<ChatMessage>,
    connection: ConnectionState,
    in_flight: usize,
    next_seq: u64,
    started: bool,
    webhook: Arc<dyn Webhook>,
    transcript: Option<Arc<dyn TranscriptSink>>,
    notifier: Arc<dyn Notifier>,
    pending_logs: JoinSet<()>,
}

impl ChatSession {
    /// Create a session for a validated contact
    pub fn new(contact: Contact, options: SessionOptions, webhook: Arc<dyn Webhook>) -> Self {
        Self {
            id: new_session_id(),
            contact,
            options,
            messages: Vec::new(),
            connection: ConnectionState::Connecting,
            in_flight: 0,
            next_seq: 0,
            started: false,
            webhook,
            transcript: None,
            notifier: Arc::new(TracingNotifier),
            pending_logs: JoinSet::new(),
        }
    }

    /// Log every appended message to `sink`
    pub fn with_transcript(mut self, sink: Arc<dyn TranscriptSink>) -> Self {
        self.transcript = Some(sink);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    /// True while any webhook request is outstanding
    pub fn is_waiting(&self) -> bool {
        self.in_flight > 0
    }

    /// Webhook handle, for callers posting pending turns themselves
    pub fn webhook(&self) -> Arc<dyn Webhook> {
        Arc::clone(&self.webhook)
    }

    pub fn greeting_text(&self) -> String {
        self.options.greeting.replace("{name}", &self.contact.name)
    }

    /// Append the greeting and build the `initialize_chat` request.
    ///
    /// Returns `None` if the session was already started.
    pub fn begin_initialize(&mut self) -> Option<PendingTurn> {
        if self.started {
            return None;
        }
        self.started = true;

        let greeting = self.greeting_text();
        self.append(Author::Agent, greeting);
        self.in_flight += 1;

        tracing::info!(session_id = %self.id, "Starting chat session");
        Some(PendingTurn {
            payload: WebhookPayload::initialize(&self.id, &self.contact),
        })
    }

    /// Append the user's message and build the `send_message` request.
    ///
    /// Blank input is ignored and returns `None`.
    pub fn begin_turn(&mut self, text: &str) -> Option<PendingTurn> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.append(Author::User, text);
        self.in_flight += 1;

        Some(PendingTurn {
            payload: WebhookPayload::send_message(&self.id, &self.contact, text),
        })
    }

    /// Apply the webhook outcome for a pending turn.
    ///
    /// Returns the agent message that was appended, if any. A failed
    /// initialize appends nothing; a failed send appends the fallback.
    pub fn finish_turn(
        &mut self,
        turn: PendingTurn,
        outcome: ChatResult<Value>,
    ) -> Option<&ChatMessage> {
        self.in_flight = self.in_flight.saturating_sub(1);

        let reply = outcome.and_then(|body| self.options.reply_field.require(&body));

        match reply {
            Ok(text) => {
                self.set_connection(ConnectionState::Connected);
                self.append(Author::Agent, text);
                self.messages.last()
            }
            Err(e) if turn.is_initialize() => {
                tracing::warn!(session_id = %self.id, "Initialize request failed: {}", e);
                self.set_connection(ConnectionState::Disconnected);
                None
            }
            Err(e) => {
                tracing::warn!(session_id = %self.id, "Send failed, using fallback: {}", e);
                self.set_connection(ConnectionState::Disconnected);
                self.notifier.notify(Notice::SendFailed);
                let fallback = self.options.fallback.clone();
                self.append(Author::Agent, fallback);
                self.messages.last()
            }
        }
    }

    /// Greet the user and run the initialize exchange
    pub async fn start(&mut self) -> Option<&ChatMessage> {
        let turn = self.begin_initialize()?;
        let webhook = self.webhook();
        let outcome = webhook.post(turn.payload()).await;
        self.finish_turn(turn, outcome)
    }

    /// Send one user message and wait for the agent's answer.
    ///
    /// Returns the appended agent message (reply or fallback), or `None`
    /// when `text` is blank and nothing was sent.
    pub async fn send(&mut self, text: &str) -> Option<&ChatMessage> {
        let turn = self.begin_turn(text)?;
        let webhook = self.webhook();
        let outcome = webhook.post(turn.payload()).await;
        self.finish_turn(turn, outcome)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            contact: self.contact.clone(),
            connection_state: self.connection,
            messages: self.messages.clone(),
        }
    }

    /// Wait for outstanding transcript writes.
    ///
    /// Dropping the session aborts writes that are still in flight.
    pub async fn flush_transcript(&mut self) {
        while let Some(result) = self.pending_logs.join_next().await {
            if let Err(e) = result {
                tracing::warn!("Transcript task did not complete: {}", e);
            }
        }
    }

    fn append(&mut self, author: Author, text: impl Into<String>) {
        let message = ChatMessage::new(&self.id, self.next_seq, author, text);
        self.next_seq += 1;
        self.log_to_transcript(&message);
        self.messages.push(message);
    }

    fn log_to_transcript(&mut self, message: &ChatMessage) {
        let Some(sink) = self.transcript.clone() else {
            return;
        };

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("No async runtime, transcript entry dropped");
                return;
            }
        };

        let record = TranscriptRecord::new(self.id.clone(), message.log_line());
        self.pending_logs.spawn_on(
            async move {
                if let Err(e) = sink.record(&record).await {
                    tracing::warn!(session_id = %record.session_id, "Transcript logging failed: {}", e);
                }
            },
            &handle,
        );
    }

    fn set_connection(&mut self, state: ConnectionState) {
        if self.connection == state {
            return;
        }
        tracing::info!(
            session_id = %self.id,
            from = self.connection.label(),
            to = state.label(),
            "Connection state changed"
        );
        self.connection = state;
        match state {
            ConnectionState::Connected => self.notifier.notify(Notice::Connected),
            ConnectionState::Disconnected => self.notifier.notify(Notice::Disconnected),
            ConnectionState::Connecting => {}
        }
    }
}
