//! Send command - One message, non-interactive.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use desk_chat::{ChatError, TracingNotifier};

use super::{ContactArgs, SessionArgs};
use crate::console::{print_new_messages, status_line};

#[derive(Args)]
pub struct SendArgs {
    /// Message to send
    message: String,

    #[command(flatten)]
    contact: ContactArgs,

    #[command(flatten)]
    session: SessionArgs,

    /// Print the session as JSON instead of a transcript
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: SendArgs) -> Result<()> {
    let contact = args
        .contact
        .to_form()
        .submit()
        .map_err(ChatError::Validation)?;

    if args.message.trim().is_empty() {
        anyhow::bail!("Message is empty, nothing to send");
    }

    let config = args.session.load_config()?;
    let mut session = args
        .session
        .build_session(&config, contact, Arc::new(TracingNotifier))?;

    info!(session_id = %session.id(), "Sending one message");
    session.start().await;
    session.send(&args.message).await;
    session.flush_transcript().await;

    if args.json {
        let rendered = serde_json::to_string_pretty(&session.snapshot())
            .context("Failed to serialize session")?;
        println!("{}", rendered);
    } else {
        print_new_messages(session.messages(), 0);
        println!();
        println!("{}", status_line(session.connection_state()));
    }

    Ok(())
}
