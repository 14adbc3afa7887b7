//! Intake form that gates the chat session.
//!
//! The form collects a name, an email and an optional request. Submitting it
//! is a purely local check: nothing goes over the network until a valid
//! [`Contact`] has been produced.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::types::Contact;

/// `local@domain.tld`, nothing more elaborate
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

/// Check an email against the accepted `local@domain.tld` shape
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Form fields, used as keys of [`ValidationErrors`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IntakeField {
    Name,
    Email,
    Request,
}

impl IntakeField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Request => "request",
        }
    }
}

/// Field-keyed validation failures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    fields: BTreeMap<IntakeField, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: IntakeField, message: impl Into<String>) {
        self.fields.insert(field, message.into());
    }

    pub fn get(&self, field: IntakeField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IntakeField, &str)> {
        self.fields.iter().map(|(field, msg)| (*field, msg.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, msg)| format!("{}: {}", field.as_str(), msg))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl From<ValidationErrors> for ChatError {
    fn from(errors: ValidationErrors) -> Self {
        ChatError::Validation(errors)
    }
}

/// Raw, unvalidated form input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub request: String,
}

impl IntakeForm {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn request(mut self, request: impl Into<String>) -> Self {
        self.request = request.into();
        self
    }

    /// Validate every field without consuming the form
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.add(IntakeField::Name, "Name is required");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add(IntakeField::Email, "Email is required");
        } else if !is_valid_email(email) {
            errors.add(IntakeField::Email, "Please enter a valid email address");
        }

        errors
    }

    /// Validate the form and produce the contact handed to the chat session
    pub fn submit(&self) -> Result<Contact, ValidationErrors> {
        let errors = self.validate();
        if !errors.is_empty() {
            tracing::debug!(errors = %errors, "Intake form rejected");
            return Err(errors);
        }

        let request = self.request.trim();
        Ok(Contact {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            request: (!request.is_empty()).then(|| request.to_string()),
        })
    }
}
