//! Record domain model.
//!
//! # Responsibility
//! - Define the canonical `{ id, name, email }` record.
//! - Validate write payloads before they reach storage.
//!
//! # Invariants
//! - `id` is assigned by storage and never changes afterwards.
//! - `name` is non-empty and at most `NAME_MAX_CHARS` characters.
//! - `email` is a `local@domain.tld` address of at most `EMAIL_MAX_CHARS`.

use crate::model::sanitize::{sanitize_email, sanitize_text_field};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned record identifier. Positive once persisted.
pub type RecordId = i64;

/// Column bound for `name`.
pub const NAME_MAX_CHARS: usize = 100;
/// Column bound for `email`.
pub const EMAIL_MAX_CHARS: usize = 100;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~.-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+$")
        .expect("valid email regex")
});

/// One persisted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub email: String,
}

/// Name/email payload for insert and update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordDraft {
    pub name: String,
    pub email: String,
}

impl RecordDraft {
    /// Creates a draft from already-clean values.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Creates a draft from raw submitted values, sanitizing both fields.
    ///
    /// The result may still be invalid; call [`RecordDraft::validate`].
    pub fn from_submission(raw_name: &str, raw_email: &str) -> Self {
        Self {
            name: sanitize_text_field(raw_name),
            email: sanitize_email(raw_email),
        }
    }

    /// Checks required-field, length and email-shape rules.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.name.trim().is_empty() {
            return Err(RecordValidationError::EmptyName);
        }
        if self.name.chars().count() > NAME_MAX_CHARS {
            return Err(RecordValidationError::NameTooLong {
                max: NAME_MAX_CHARS,
            });
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(RecordValidationError::InvalidEmail);
        }
        if self.email.chars().count() > EMAIL_MAX_CHARS {
            return Err(RecordValidationError::EmailTooLong {
                max: EMAIL_MAX_CHARS,
            });
        }
        Ok(())
    }
}

/// Validation failure for record payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValidationError {
    EmptyName,
    NameTooLong { max: usize },
    InvalidEmail,
    EmailTooLong { max: usize },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name is required"),
            Self::NameTooLong { max } => write!(f, "name exceeds {max} characters"),
            Self::InvalidEmail => write!(f, "a valid email address is required"),
            Self::EmailTooLong { max } => write!(f, "email exceeds {max} characters"),
        }
    }
}

impl Error for RecordValidationError {}
