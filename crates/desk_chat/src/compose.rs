//! Message composer: the input box in front of the session.
//!
//! Enter submits. Enter with a modifier held inserts a newline so users can
//! write multi-line messages. A blank buffer is never submitted and is left
//! exactly as it was.

/// Keystrokes the composer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    Enter { modifier: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeAction {
    None,
    /// Trimmed text ready to send; the buffer has been cleared
    Submit(String),
}

#[derive(Debug, Clone, Default)]
pub struct Composer {
    buffer: String,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// True when nothing but whitespace has been typed
    pub fn is_blank(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn handle(&mut self, key: KeyInput) -> ComposeAction {
        match key {
            KeyInput::Char(c) => {
                self.buffer.push(c);
                ComposeAction::None
            }
            KeyInput::Backspace => {
                self.buffer.pop();
                ComposeAction::None
            }
            KeyInput::Enter { modifier: true } => {
                self.buffer.push('\n');
                ComposeAction::None
            }
            KeyInput::Enter { modifier: false } => self.submit(),
        }
    }

    fn submit(&mut self) -> ComposeAction {
        let text = self.buffer.trim();
        if text.is_empty() {
            return ComposeAction::None;
        }
        let text = text.to_string();
        self.buffer.clear();
        ComposeAction::Submit(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(composer: &mut Composer, text: &str) {
        for c in text.chars() {
            composer.handle(KeyInput::Char(c));
        }
    }

    #[test]
    fn test_enter_submits_and_clears() {
        let mut composer = Composer::new();
        type_text(&mut composer, "  help  ");

        let action = composer.handle(KeyInput::Enter { modifier: false });
        assert_eq!(action, ComposeAction::Submit("help".to_string()));
        assert_eq!(composer.buffer(), "");
    }

    #[test]
    fn test_modifier_enter_inserts_newline() {
        let mut composer = Composer::new();
        type_text(&mut composer, "line one");
        assert_eq!(
            composer.handle(KeyInput::Enter { modifier: true }),
            ComposeAction::None
        );
        type_text(&mut composer, "line two");

        let action = composer.handle(KeyInput::Enter { modifier: false });
        assert_eq!(
            action,
            ComposeAction::Submit("line one\nline two".to_string())
        );
    }

    #[test]
    fn test_blank_buffer_is_not_submitted() {
        let mut composer = Composer::new();
        type_text(&mut composer, "   ");
        composer.handle(KeyInput::Enter { modifier: true });

        let action = composer.handle(KeyInput::Enter { modifier: false });
        assert_eq!(action, ComposeAction::None);
        assert_eq!(composer.buffer(), "   \n");
    }

    #[test]
    fn test_backspace() {
        let mut composer = Composer::new();
        type_text(&mut composer, "hey");
        composer.handle(KeyInput::Backspace);
        assert_eq!(composer.buffer(), "he");
    }

    #[test]
    fn test_whitespace_only_buffer_is_blank() {
        let mut composer = Composer::new();
        composer.handle(KeyInput::Enter { modifier: true });
        assert_eq!(composer.buffer(), "\n");
        assert!(composer.is_blank());

        composer.clear();
        assert_eq!(composer.buffer(), "");
    }
}
