//! User-facing notices (connection changes, failed sends, form errors).

use crate::intake::ValidationErrors;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Connected,
    Disconnected,
    /// A send fell back to the canned reply
    SendFailed,
    ValidationFailed(ValidationErrors),
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Self::Connected => "Connected to support".to_string(),
            Self::Disconnected => "Connection to support lost".to_string(),
            Self::SendFailed => "Message could not be delivered".to_string(),
            Self::ValidationFailed(errors) => format!("Please fix the form: {}", errors),
        }
    }
}

/// Surface that shows notices to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Default notifier: notices only go to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Connected => tracing::info!("{}", notice.text()),
            _ => tracing::warn!("{}", notice.text()),
        }
    }
}
