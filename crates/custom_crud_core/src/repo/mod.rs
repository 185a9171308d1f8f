//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the record data access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `RecordDraft::validate()` before persistence.
//! - Update/delete of a missing id is a no-op reported as `false`, not an error.

pub mod record_repo;
