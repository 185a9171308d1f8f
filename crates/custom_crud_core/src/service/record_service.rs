//! Record use-case service.
//!
//! # Responsibility
//! - Turn raw submitted values into validated drafts.
//! - Pick insert or update from the submitted id.
//! - Report outcomes the admin surface can show to the operator.
//!
//! # Invariants
//! - Invalid input never reaches the repository.
//! - Missing update/delete targets are reported as `Missing`, not as errors.

use crate::model::record::{Record, RecordDraft, RecordId, RecordValidationError};
use crate::repo::record_repo::{RecordRepository, RepoError, RepoResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for record use-cases.
#[derive(Debug)]
pub enum RecordServiceError {
    /// Submitted values failed sanitization/validation.
    Validation(RecordValidationError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for RecordServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RecordServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for RecordServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<RecordValidationError> for RecordServiceError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Result of a save submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(RecordId),
    Updated(RecordId),
    /// Positive id that matched no row; nothing changed.
    Missing(RecordId),
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(RecordId),
    Missing(RecordId),
}

/// Record service facade over repository implementations.
pub struct RecordService<R: RecordRepository> {
    repo: R,
}

impl<R: RecordRepository> RecordService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Sanitizes and validates a submission, then inserts or updates.
    ///
    /// `id > 0` updates that row; anything else inserts a new one.
    pub fn save(
        &self,
        id: RecordId,
        raw_name: &str,
        raw_email: &str,
    ) -> Result<SaveOutcome, RecordServiceError> {
        let draft = RecordDraft::from_submission(raw_name, raw_email);
        draft.validate()?;

        if id > 0 {
            if self.repo.update_record(id, &draft)? {
                Ok(SaveOutcome::Updated(id))
            } else {
                Ok(SaveOutcome::Missing(id))
            }
        } else {
            let new_id = self.repo.insert_record(&draft)?;
            Ok(SaveOutcome::Created(new_id))
        }
    }

    /// Deletes one row by id.
    pub fn delete(&self, id: RecordId) -> RepoResult<DeleteOutcome> {
        if self.repo.delete_record(id)? {
            Ok(DeleteOutcome::Deleted(id))
        } else {
            Ok(DeleteOutcome::Missing(id))
        }
    }

    /// Gets one record by id.
    pub fn get(&self, id: RecordId) -> RepoResult<Option<Record>> {
        self.repo.get_record(id)
    }

    /// Lists all records in storage order.
    pub fn list(&self) -> RepoResult<Vec<Record>> {
        self.repo.list_records()
    }
}
