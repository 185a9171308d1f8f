//! SQLite storage bootstrap and schema provisioning entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Provision the record table before any data access.
//!
//! # Invariants
//! - The record table name is an explicit value, never process-global state.
//! - Core code must not read/write records before provisioning succeeds.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory};

/// Suffix appended to the configured prefix to form the record table name.
pub const RECORD_TABLE_SUFFIX: &str = "custom_crud";

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    InvalidTableName(String),
    IncompatibleTable {
        table: String,
        missing_column: &'static str,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidTableName(name) => {
                write!(f, "invalid table name `{name}`; expected [A-Za-z_][A-Za-z0-9_]*")
            }
            Self::IncompatibleTable {
                table,
                missing_column,
            } => write!(
                f,
                "existing table `{table}` is missing required column `{missing_column}`"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidTableName(_) | Self::IncompatibleTable { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Validated SQL identifier naming the record table.
///
/// Table names cannot be bound as SQL parameters, so every statement that
/// interpolates one must go through this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Validates a full table name.
    pub fn new(name: impl Into<String>) -> DbResult<Self> {
        let name = name.into();
        if IDENTIFIER_RE.is_match(&name) {
            Ok(Self(name))
        } else {
            Err(DbError::InvalidTableName(name))
        }
    }

    /// Builds `<prefix>custom_crud`.
    pub fn from_prefix(prefix: &str) -> DbResult<Self> {
        Self::new(format!("{}{RECORD_TABLE_SUFFIX}", prefix.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{DbError, TableName};

    #[test]
    fn from_prefix_appends_suffix() {
        let table = TableName::from_prefix("wp_").expect("prefix should be valid");
        assert_eq!(table.as_str(), "wp_custom_crud");
        assert_eq!(
            TableName::from_prefix("").expect("empty prefix is valid").as_str(),
            "custom_crud"
        );
    }

    #[test]
    fn rejects_names_that_are_not_plain_identifiers() {
        for bad in ["wp-", "x; DROP TABLE y;--", "1abc", "a b"] {
            let err = TableName::from_prefix(bad).expect_err("name must be rejected");
            assert!(matches!(err, DbError::InvalidTableName(_)));
        }
        assert!(TableName::new("9table").is_err());
    }
}
