//! Integration tests for chat sessions against a mock webhook server.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use desk_chat::{
    Author, ChatSession, ConnectionState, HttpTranscriptSink, HttpWebhook, IntakeForm,
    JsonlTranscriptSink, ReplyField, SessionOptions,
};

fn webhook_for(server: &MockServer) -> Arc<HttpWebhook> {
    Arc::new(HttpWebhook::new(format!("{}/webhook/support", server.uri()), Duration::from_secs(5)).unwrap())
}

fn ana() -> desk_chat::Contact {
    IntakeForm::new()
        .name("Ana")
        .email("ana@ex.com")
        .submit()
        .unwrap()
}

async fn received_bodies(server: &MockServer, route: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == route)
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

/// Full happy path: intake, greeting, one exchange.
#[tokio::test]
async fn test_intake_to_reply_scenario() {
    let server = MockServer::start().await;

    // The flow acknowledges initialization without a displayable reply
    Mock::given(method("POST"))
        .and(path("/webhook/support"))
        .and(body_partial_json(json!({ "action": "initialize_chat" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/webhook/support"))
        .and(body_partial_json(json!({ "action": "send_message", "message": "help" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": "Sure, how can I help?"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = ChatSession::new(ana(), SessionOptions::default(), webhook_for(&server));
    session.start().await;
    assert_eq!(session.messages().len(), 1);

    session.send("help").await;

    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].author, Author::Agent);
    assert!(messages[0].text.contains("Ana"));
    assert_eq!(messages[1].author, Author::User);
    assert_eq!(messages[1].text, "help");
    assert_eq!(messages[2].author, Author::Agent);
    assert_eq!(messages[2].text, "Sure, how can I help?");
    assert_eq!(session.connection_state(), ConnectionState::Connected);
}

/// A 500 from the webhook yields exactly one fallback message.
#[tokio::test]
async fn test_server_error_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook/support"))
        .respond_with(ResponseTemplate::new(500).set_body_string("workflow crashed"))
        .mount(&server)
        .await;

    let options = SessionOptions {
        fallback: "Technical difficulty, please try again.".to_string(),
        ..Default::default()
    };
    let mut session = ChatSession::new(ana(), options, webhook_for(&server));
    session.start().await;
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    assert_eq!(session.messages().len(), 1);

    session.send("are you there?").await;

    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].text, "Technical difficulty, please try again.");
    let fallbacks = messages
        .iter()
        .filter(|m| m.text == "Technical difficulty, please try again.")
        .count();
    assert_eq!(fallbacks, 1);
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
}

/// Recovering after a failure flips the indicator back to connected.
#[tokio::test]
async fn test_reconnects_after_successful_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "action": "initialize_chat" })))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "action": "send_message" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": "hi" })))
        .mount(&server)
        .await;

    let mut session = ChatSession::new(ana(), SessionOptions::default(), webhook_for(&server));
    session.start().await;
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);

    let reply = session.send("hello").await.cloned().unwrap();
    assert_eq!(reply.text, "hi");
    assert_eq!(session.connection_state(), ConnectionState::Connected);
}

/// Non-JSON bodies are malformed replies.
#[tokio::test]
async fn test_non_json_reply_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let options = SessionOptions::default();
    let fallback = options.fallback.clone();
    let mut session = ChatSession::new(ana(), options, webhook_for(&server));
    let reply = session.send("hello").await.cloned().unwrap();

    assert_eq!(reply.text, fallback);
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
}

/// Requests carry JSON content type, the contact and one stable session id.
#[tokio::test]
async fn test_requests_share_session_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook/support"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": "ok" })))
        .expect(3)
        .mount(&server)
        .await;

    let contact = IntakeForm::new()
        .name("Ana")
        .email("ana@ex.com")
        .request("Refund for order 42")
        .submit()
        .unwrap();
    let mut session = ChatSession::new(contact, SessionOptions::default(), webhook_for(&server));
    session.start().await;
    session.send("first").await;
    session.send("second").await;

    let bodies = received_bodies(&server, "/webhook/support").await;
    assert_eq!(bodies.len(), 3);
    for body in &bodies {
        assert_eq!(body["sessionId"], session.id());
        assert_eq!(body["email"], "ana@ex.com");
        assert_eq!(body["request"], "Refund for order 42");
    }
    assert_eq!(bodies[0]["action"], "initialize_chat");
    assert_eq!(bodies[1]["message"], "first");
    assert_eq!(bodies[2]["message"], "second");
}

/// Legacy `message.value` replies are read when that strategy is selected.
#[tokio::test]
async fn test_legacy_reply_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "value": "Legacy flow reply" }
        })))
        .mount(&server)
        .await;

    let options = SessionOptions {
        reply_field: ReplyField::MessageValue,
        ..Default::default()
    };
    let mut session = ChatSession::new(ana(), options, webhook_for(&server));
    let reply = session.send("hello").await.cloned().unwrap();
    assert_eq!(reply.text, "Legacy flow reply");
}

/// Unreachable webhook behaves like any other network failure.
#[tokio::test]
async fn test_unreachable_webhook() {
    let webhook = Arc::new(
        HttpWebhook::new("http://127.0.0.1:9/webhook", Duration::from_secs(2)).unwrap(),
    );
    let mut session = ChatSession::new(ana(), SessionOptions::default(), webhook);
    session.start().await;
    session.send("hello").await;

    assert_eq!(session.messages().len(), 3);
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
}

/// Transcript records reach the logging endpoint with the API key headers.
#[tokio::test]
async fn test_http_transcript_logging() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook/support"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": "Sure" })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/chat_logs"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(201))
        .expect(4)
        .mount(&server)
        .await;

    let sink = Arc::new(
        HttpTranscriptSink::new(
            format!("{}/rest/v1/chat_logs", server.uri()),
            Some("anon-key".to_string()),
        )
        .unwrap(),
    );
    let mut session = ChatSession::new(ana(), SessionOptions::default(), webhook_for(&server))
        .with_transcript(sink);
    session.start().await;
    session.send("help").await;
    session.flush_transcript().await;

    let logs = received_bodies(&server, "/rest/v1/chat_logs").await;
    assert_eq!(logs.len(), 4);
    assert!(logs.iter().all(|l| l["sessionId"] == session.id()));
    let lines: Vec<&str> = logs.iter().filter_map(|l| l["message"].as_str()).collect();
    assert!(lines.contains(&"user: help"));
    assert!(lines.contains(&"agent: Sure"));
}

/// A failing logging endpoint never changes what the user sees.
#[tokio::test]
async fn test_transcript_failure_is_invisible() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook/support"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": "Sure" })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/chat_logs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sink = Arc::new(
        HttpTranscriptSink::new(format!("{}/rest/v1/chat_logs", server.uri()), None).unwrap(),
    );
    let mut session = ChatSession::new(ana(), SessionOptions::default(), webhook_for(&server))
        .with_transcript(sink);
    session.start().await;
    session.send("help").await;
    session.flush_transcript().await;

    assert_eq!(session.messages().len(), 4);
    assert_eq!(session.connection_state(), ConnectionState::Connected);
}

/// The JSON lines sink keeps one record per message.
#[tokio::test]
async fn test_jsonl_transcript_file() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": "Sure" })))
        .mount(&server)
        .await;

    let temp = tempdir().unwrap();
    let log_path = temp.path().join("chat.jsonl");

    let mut session = ChatSession::new(ana(), SessionOptions::default(), webhook_for(&server))
        .with_transcript(Arc::new(JsonlTranscriptSink::new(&log_path)));
    session.start().await;
    session.send("help").await;
    session.flush_transcript().await;

    let records = JsonlTranscriptSink::load(&log_path).unwrap();
    assert_eq!(records.len(), session.messages().len());
    assert!(records.iter().all(|r| r.session_id == session.id()));
}
