//! CLI command definitions.
//!
//! This module defines the command structure for the deskchat CLI and the
//! configuration flags shared by every command that talks to the webhook.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use desk_chat::{
    sink_from_config, ChatSession, Contact, DeskConfig, HttpWebhook, IntakeForm, Notifier,
    ReplyField,
};

pub mod chat;
pub mod check_contact;
pub mod init_config;
pub mod send;

/// deskchat - customer support chat over an automation webhook
#[derive(Parser)]
#[command(name = "deskchat")]
#[command(version, about = "deskchat - customer support chat over an automation webhook")]
#[command(long_about = r#"
deskchat collects a customer's contact details, then relays their chat
messages to an automation webhook and shows the replies.

COMMANDS:
  chat          → Fill in the intake form and start an interactive chat
  send          → Send a single message and print the transcript
  check-contact → Validate contact details without contacting anyone
  init-config   → Write a sample configuration file

CONFIGURATION:
  --config <file> (.toml, .yaml) then DESKCHAT_* environment variables,
  then command-line flags.

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or configuration
  3 - Validation failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fill in the intake form and chat interactively
    Chat(chat::ChatArgs),

    /// Send one message and print the transcript
    Send(send::SendArgs),

    /// Validate contact details
    #[command(name = "check-contact")]
    CheckContact(check_contact::CheckContactArgs),

    /// Write a sample configuration file
    #[command(name = "init-config")]
    InitConfig(init_config::InitConfigArgs),
}

/// Intake form fields
#[derive(Args, Debug, Clone, Default)]
pub struct ContactArgs {
    /// Your name
    #[arg(long)]
    pub name: Option<String>,

    /// Your email address
    #[arg(long)]
    pub email: Option<String>,

    /// What you need help with
    #[arg(long)]
    pub request: Option<String>,
}

impl ContactArgs {
    pub fn to_form(&self) -> IntakeForm {
        IntakeForm::new()
            .name(self.name.clone().unwrap_or_default())
            .email(self.email.clone().unwrap_or_default())
            .request(self.request.clone().unwrap_or_default())
    }
}

/// Webhook and transcript settings, layered over the config file
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Configuration file (.toml, .yaml or .yml)
    #[arg(short, long, env = "DESKCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Automation webhook URL
    #[arg(long)]
    pub webhook_url: Option<String>,

    /// Response field holding the reply: output, message, message.value or any
    #[arg(long)]
    pub reply_field: Option<ReplyField>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Transcript logging endpoint (enables logging)
    #[arg(long)]
    pub transcript_endpoint: Option<String>,

    /// Append the transcript to a JSON lines file (enables logging)
    #[arg(long)]
    pub transcript_file: Option<PathBuf>,

    /// Disable transcript logging even if configured
    #[arg(long, conflicts_with_all = ["transcript_endpoint", "transcript_file"])]
    pub no_transcript: bool,
}

impl SessionArgs {
    /// Load the config file and environment, then apply flags
    pub fn load_config(&self) -> Result<DeskConfig> {
        let config =
            DeskConfig::load(self.config.as_deref()).context("Failed to load configuration")?;
        self.layer_over(config)
    }

    /// Apply the command-line flags on top of `config` and validate the result
    pub fn layer_over(&self, mut config: DeskConfig) -> Result<DeskConfig> {
        if let Some(ref url) = self.webhook_url {
            config.webhook.url = url.clone();
        }
        if let Some(field) = self.reply_field {
            config.webhook.reply_field = field;
        }
        if let Some(secs) = self.timeout {
            config.webhook.timeout_secs = secs;
        }
        if let Some(ref endpoint) = self.transcript_endpoint {
            config.transcript.endpoint = Some(endpoint.clone());
            config.transcript.enabled = true;
        }
        if let Some(ref file) = self.transcript_file {
            config.transcript.file = Some(file.display().to_string());
            config.transcript.enabled = true;
        }
        if self.no_transcript {
            config.transcript.enabled = false;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Build a session wired to the configured webhook and transcript sink
    pub fn build_session(
        &self,
        config: &DeskConfig,
        contact: Contact,
        notifier: Arc<dyn Notifier>,
    ) -> Result<ChatSession> {
        let webhook = HttpWebhook::from_config(&config.webhook)
            .context("Failed to create webhook client")?;

        let mut session = ChatSession::new(contact, config.session_options(), Arc::new(webhook))
            .with_notifier(notifier);

        if let Some(sink) =
            sink_from_config(&config.transcript).context("Failed to set up transcript logging")?
        {
            session = session.with_transcript(sink);
        }

        Ok(session)
    }
}
