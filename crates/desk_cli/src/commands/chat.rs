//! Chat command - Intake form followed by an interactive conversation.
//!
//! Webhook requests run in the background. Input keeps being read while
//! they are outstanding, and replies are printed as they arrive, in
//! whatever order the webhook answers.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{info, warn};

use desk_chat::{
    ChatResult, ComposeAction, Composer, Contact, IntakeField, IntakeForm, KeyInput, Notice,
    Notifier, PendingTurn, Webhook,
};

use super::{ContactArgs, SessionArgs};
use crate::console::{print_new_messages, show_prompt, status_line, Console, ConsoleNotifier};

#[derive(Args)]
pub struct ChatArgs {
    #[command(flatten)]
    contact: ContactArgs,

    #[command(flatten)]
    session: SessionArgs,
}

/// A finished webhook request, paired with the turn it answers
type Answer = (PendingTurn, ChatResult<Value>);

/// What one line of input asks the chat loop to do
#[derive(Debug, PartialEq, Eq)]
enum LineAction {
    Quit,
    Status,
    /// Keep composing, nothing to send yet
    Continue,
    Send(String),
}

pub async fn execute(args: ChatArgs) -> Result<()> {
    let config = args.session.load_config()?;
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
    let mut console = Console::new();

    println!("💬 Customer support");
    println!();

    let Some(contact) = fill_intake_form(&mut console, args.contact.to_form(), notifier.as_ref()).await?
    else {
        return Ok(());
    };

    let mut session = args
        .session
        .build_session(&config, contact, Arc::clone(&notifier))?;
    info!(session_id = %session.id(), "Chat session created");

    println!();
    println!("Type a message and press Enter. End a line with \\ to continue on the next line.");
    println!("Commands: /status, /quit");
    println!();

    let mut in_flight: JoinSet<Answer> = JoinSet::new();
    let mut shown = 0;

    // The greeting is shown before the initialize request goes out
    if let Some(turn) = session.begin_initialize() {
        shown = print_new_messages(session.messages(), shown);
        dispatch(&mut in_flight, session.webhook(), turn);
    }

    let mut composer = Composer::new();
    let mut input_open = true;
    let mut typing_shown = false;
    show_prompt(prompt_label(&composer))?;

    loop {
        tokio::select! {
            line = console.next_line(), if input_open => {
                let Some(line) = line? else {
                    // Let outstanding replies land before leaving
                    input_open = false;
                    if in_flight.is_empty() {
                        break;
                    }
                    continue;
                };

                match handle_line(&mut composer, &line) {
                    LineAction::Quit => break,
                    LineAction::Status => println!("{}", status_line(session.connection_state())),
                    LineAction::Continue => {}
                    LineAction::Send(text) => {
                        if let Some(turn) = session.begin_turn(&text) {
                            // The user's own text is already on screen
                            shown = session.messages().len();
                            dispatch(&mut in_flight, session.webhook(), turn);
                        }
                    }
                }
            }
            Some(joined) = in_flight.join_next() => {
                match joined {
                    Ok((turn, outcome)) => {
                        session.finish_turn(turn, outcome);
                    }
                    Err(e) => warn!("Webhook request task failed: {}", e),
                }
                if input_open {
                    println!();
                }
                shown = print_new_messages(session.messages(), shown);

                if !input_open && in_flight.is_empty() {
                    break;
                }
            }
            else => break,
        }

        if session.is_waiting() != typing_shown {
            typing_shown = session.is_waiting();
            if typing_shown {
                println!("   Support is typing…");
            }
        }
        if input_open {
            show_prompt(prompt_label(&composer))?;
        }
    }

    if !in_flight.is_empty() {
        warn!(pending = in_flight.len(), "Leaving with webhook requests still outstanding");
    }
    session.flush_transcript().await;
    println!();
    println!("👋 Chat ended ({} messages)", session.messages().len());

    Ok(())
}

/// Post `turn` in the background
fn dispatch(in_flight: &mut JoinSet<Answer>, webhook: Arc<dyn Webhook>, turn: PendingTurn) {
    in_flight.spawn(async move {
        let outcome = webhook.post(turn.payload()).await;
        (turn, outcome)
    });
}

fn prompt_label(composer: &Composer) -> &'static str {
    if composer.is_blank() {
        "> "
    } else {
        "… "
    }
}

/// Feed one input line to the composer.
///
/// Commands are only recognised at the start of a message. A trailing `\`
/// stands for modifier+Enter and continues the message on the next line.
fn handle_line(composer: &mut Composer, line: &str) -> LineAction {
    if composer.is_blank() {
        match line.trim() {
            "/quit" | "/exit" => return LineAction::Quit,
            "/status" => {
                composer.clear();
                return LineAction::Status;
            }
            _ => {}
        }
    }

    let action = match line.strip_suffix('\\') {
        Some(partial) => {
            composer.push_str(partial);
            composer.handle(KeyInput::Enter { modifier: true })
        }
        None => {
            composer.push_str(line);
            composer.handle(KeyInput::Enter { modifier: false })
        }
    };

    match action {
        ComposeAction::Submit(text) => LineAction::Send(text),
        ComposeAction::None => LineAction::Continue,
    }
}

/// Ask for missing fields until the form validates; `None` on end of input
async fn fill_intake_form(
    console: &mut Console,
    mut form: IntakeForm,
    notifier: &dyn Notifier,
) -> Result<Option<Contact>> {
    let mut ask_name = form.name.trim().is_empty();
    let mut ask_email = form.email.trim().is_empty();
    let mut ask_request = form.request.trim().is_empty();

    loop {
        if ask_name {
            let Some(name) = console.prompt("Name: ").await? else {
                return Ok(None);
            };
            form.name = name;
        }
        if ask_email {
            let Some(email) = console.prompt("Email: ").await? else {
                return Ok(None);
            };
            form.email = email;
        }
        if ask_request {
            let Some(request) = console.prompt("How can we help? (optional): ").await? else {
                return Ok(None);
            };
            form.request = request;
            ask_request = false;
        }

        match form.submit() {
            Ok(contact) => return Ok(Some(contact)),
            Err(errors) => {
                ask_name = errors.get(IntakeField::Name).is_some();
                ask_email = errors.get(IntakeField::Email).is_some();
                notifier.notify(Notice::ValidationFailed(errors));
            }
        }
    }
}
