//! Best-effort transcript logging.
//!
//! Every message appended to a session is also offered to a
//! [`TranscriptSink`] as a `{sessionId, "<author>: <text>"}` record. Sinks may
//! fail; the session logs the failure and carries on.
//!
//! JSON lines file layout:
//! ```text
//! {"sessionId":"...","message":"agent: Hi Ana!","loggedAt":"..."}
//! {"sessionId":"...","message":"user: help","loggedAt":"..."}
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::TranscriptConfig;
use crate::error::{ChatError, ChatResult};

/// One logged transcript line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptRecord {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// `<author>: <text>`
    pub message: String,
    #[serde(rename = "loggedAt")]
    pub logged_at: DateTime<Utc>,
}

impl TranscriptRecord {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
            logged_at: Utc::now(),
        }
    }
}

/// Append-only destination for transcript records
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    async fn record(&self, record: &TranscriptRecord) -> ChatResult<()>;
}

/// Inserts records through a hosted database's REST endpoint
pub struct HttpTranscriptSink {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpTranscriptSink {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> ChatResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            client,
        })
    }
}

#[async_trait]
impl TranscriptSink for HttpTranscriptSink {
    async fn record(&self, record: &TranscriptRecord) -> ChatResult<()> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "sessionId": record.session_id,
                "message": record.message,
            }));

        if let Some(ref key) = self.api_key {
            request = request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Transcript(format!(
                "log endpoint returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

/// Appends records to a local JSON lines file
pub struct JsonlTranscriptSink {
    path: PathBuf,
    // Serializes appends so concurrent records never interleave
    lock: Mutex<()>,
}

impl JsonlTranscriptSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record in the file
    pub fn load(path: impl AsRef<Path>) -> ChatResult<Vec<TranscriptRecord>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(path)?;
        let mut records = Vec::new();
        for line in content.lines() {
            if !line.trim().is_empty() {
                records.push(serde_json::from_str(line)?);
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl TranscriptSink for JsonlTranscriptSink {
    async fn record(&self, record: &TranscriptRecord) -> ChatResult<()> {
        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

/// Sends each record to several sinks, failing if any of them fails
pub struct FanoutTranscriptSink {
    sinks: Vec<Arc<dyn TranscriptSink>>,
}

impl FanoutTranscriptSink {
    pub fn new(sinks: Vec<Arc<dyn TranscriptSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl TranscriptSink for FanoutTranscriptSink {
    async fn record(&self, record: &TranscriptRecord) -> ChatResult<()> {
        let mut failures = Vec::new();
        for sink in &self.sinks {
            if let Err(e) = sink.record(record).await {
                failures.push(e.to_string());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ChatError::Transcript(failures.join("; ")))
        }
    }
}

/// Build the sink described by the config, or `None` when logging is off
pub fn sink_from_config(config: &TranscriptConfig) -> ChatResult<Option<Arc<dyn TranscriptSink>>> {
    if !config.enabled {
        return Ok(None);
    }

    let mut sinks: Vec<Arc<dyn TranscriptSink>> = Vec::new();
    if let Some(ref endpoint) = config.endpoint {
        sinks.push(Arc::new(HttpTranscriptSink::new(
            endpoint.clone(),
            config.api_key.clone(),
        )?));
    }
    if let Some(ref file) = config.file {
        sinks.push(Arc::new(JsonlTranscriptSink::new(file)));
    }

    if sinks.len() > 1 {
        let fanout: Arc<dyn TranscriptSink> = Arc::new(FanoutTranscriptSink::new(sinks));
        return Ok(Some(fanout));
    }
    Ok(sinks.pop())
}
