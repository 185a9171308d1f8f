//! Record domain model and input normalization.
//!
//! # Responsibility
//! - Define the single persisted entity (`Record`) and its write shape.
//! - Normalize raw form input the way the admin surface expects.
//!
//! # Invariants
//! - Every persisted record has a non-empty name and a valid email.
//! - Deletion is a hard delete; there are no tombstones.

pub mod record;
pub mod sanitize;
