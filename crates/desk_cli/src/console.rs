//! Terminal input and transcript rendering.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use desk_chat::{Author, ChatMessage, ConnectionState, Notice, Notifier};

/// Line reader over stdin
pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `label` and read one line; `None` on end of input
    pub async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        show_prompt(label)?;
        self.next_line().await
    }

    /// Read one line; `None` on end of input.
    ///
    /// Cancel safe, so it can race other work in `tokio::select!`.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

pub fn show_prompt(label: &str) -> Result<()> {
    print!("{}", label);
    std::io::stdout().flush()?;
    Ok(())
}

/// Shows notices inline, above the next prompt
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let icon = match notice {
            Notice::Connected => "🟢",
            Notice::Disconnected => "🔴",
            Notice::SendFailed => "⚠️ ",
            Notice::ValidationFailed(_) => "❌",
        };
        println!("{} {}", icon, notice.text());
    }
}

pub fn render_message(message: &ChatMessage) -> String {
    let who = match message.author {
        Author::User => "You",
        Author::Agent => "Support",
    };
    let time = message.sent_at.with_timezone(&chrono::Local).format("%H:%M");

    let mut lines = message.text.lines();
    let first = lines.next().unwrap_or_default();
    let mut out = format!("[{}] {}: {}", time, who, first);
    for line in lines {
        out.push_str("\n        ");
        out.push_str(line);
    }
    out
}

/// Print messages from `from` onward, returning the new count shown
pub fn print_new_messages(messages: &[ChatMessage], from: usize) -> usize {
    for message in messages.iter().skip(from) {
        println!("{}", render_message(message));
    }
    messages.len()
}

pub fn status_line(state: ConnectionState) -> String {
    let icon = match state {
        ConnectionState::Connecting => "🟡",
        ConnectionState::Connected => "🟢",
        ConnectionState::Disconnected => "🔴",
    };
    format!("{} {}", icon, state.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(author: Author, text: &str) -> ChatMessage {
        ChatMessage {
            id: "s-1:000000".to_string(),
            text: text.to_string(),
            author,
            sent_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_single_line() {
        let rendered = render_message(&message(Author::User, "help"));
        assert!(rendered.ends_with("You: help"));
    }

    #[test]
    fn test_render_multi_line_indents_continuation() {
        let rendered = render_message(&message(Author::Agent, "line one\nline two"));
        assert!(rendered.contains("Support: line one"));
        assert!(rendered.ends_with("\n        line two"));
    }

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(ConnectionState::Disconnected), "🔴 disconnected");
    }
}
