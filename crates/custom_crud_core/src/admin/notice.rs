//! Outcome notices carried on the redirect back to the listing page.

use crate::model::record::RecordValidationError;
use crate::service::record_service::{DeleteOutcome, SaveOutcome};

/// Operator-facing outcome of the previous submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Created,
    Updated,
    Deleted,
    Missing,
    InvalidName,
    NameTooLong,
    InvalidEmail,
    EmailTooLong,
    TokenRejected,
    StorageError,
}

const ALL_NOTICES: [Notice; 10] = [
    Notice::Created,
    Notice::Updated,
    Notice::Deleted,
    Notice::Missing,
    Notice::InvalidName,
    Notice::NameTooLong,
    Notice::InvalidEmail,
    Notice::EmailTooLong,
    Notice::TokenRejected,
    Notice::StorageError,
];

impl Notice {
    /// Stable query-string value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Missing => "missing",
            Self::InvalidName => "invalid_name",
            Self::NameTooLong => "name_too_long",
            Self::InvalidEmail => "invalid_email",
            Self::EmailTooLong => "email_too_long",
            Self::TokenRejected => "token_rejected",
            Self::StorageError => "storage_error",
        }
    }

    /// Parses a query-string value; unknown values are `None`.
    pub fn parse(value: &str) -> Option<Self> {
        ALL_NOTICES
            .into_iter()
            .find(|notice| notice.as_str() == value)
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Created => "Record created.",
            Self::Updated => "Record updated.",
            Self::Deleted => "Record deleted.",
            Self::Missing => "That record no longer exists; nothing was changed.",
            Self::InvalidName => "Name is required.",
            Self::NameTooLong => "Name is too long.",
            Self::InvalidEmail => "A valid email address is required.",
            Self::EmailTooLong => "Email address is too long.",
            Self::TokenRejected => "The delete link has expired or is invalid. Please try again.",
            Self::StorageError => "The change could not be saved. Please try again.",
        }
    }

    pub fn is_error(self) -> bool {
        !matches!(
            self,
            Self::Created | Self::Updated | Self::Deleted | Self::Missing
        )
    }
}

impl From<SaveOutcome> for Notice {
    fn from(value: SaveOutcome) -> Self {
        match value {
            SaveOutcome::Created(_) => Self::Created,
            SaveOutcome::Updated(_) => Self::Updated,
            SaveOutcome::Missing(_) => Self::Missing,
        }
    }
}

impl From<DeleteOutcome> for Notice {
    fn from(value: DeleteOutcome) -> Self {
        match value {
            DeleteOutcome::Deleted(_) => Self::Deleted,
            DeleteOutcome::Missing(_) => Self::Missing,
        }
    }
}

impl From<RecordValidationError> for Notice {
    fn from(value: RecordValidationError) -> Self {
        match value {
            RecordValidationError::EmptyName => Self::InvalidName,
            RecordValidationError::NameTooLong { .. } => Self::NameTooLong,
            RecordValidationError::InvalidEmail => Self::InvalidEmail,
            RecordValidationError::EmailTooLong { .. } => Self::EmailTooLong,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Notice, ALL_NOTICES};

    #[test]
    fn every_notice_round_trips_through_its_query_value() {
        for notice in ALL_NOTICES {
            assert_eq!(Notice::parse(notice.as_str()), Some(notice));
        }
        assert_eq!(Notice::parse("<script>"), None);
    }

    #[test]
    fn only_failures_are_errors() {
        assert!(!Notice::Created.is_error());
        assert!(!Notice::Missing.is_error());
        assert!(Notice::TokenRejected.is_error());
        assert!(Notice::InvalidEmail.is_error());
    }
}
