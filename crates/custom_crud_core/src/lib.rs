//! Core domain logic for the custom CRUD admin.
//! This crate is the single source of truth for record invariants.

pub mod admin;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod security;
pub mod service;

pub use admin::controller::{AdminController, AdminResponse};
pub use admin::request::{AdminPageQuery, AdminPostRequest};
pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult, TableName};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingStatus};
pub use model::record::{Record, RecordDraft, RecordId, RecordValidationError};
pub use repo::record_repo::{RecordRepository, RepoError, RepoResult, SqliteRecordRepository};
pub use security::capability::{AdminPrincipal, Capability};
pub use security::nonce::NonceIssuer;
pub use service::record_service::{DeleteOutcome, RecordService, RecordServiceError, SaveOutcome};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
