//! Record repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide single-statement CRUD APIs over the record table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `RecordDraft::validate()` before SQL mutations.
//! - Read paths skip rows with non-positive ids and log them; they never fail the read.
//! - Listing order is ascending id (storage order).

use crate::db::schema::{table_exists, table_has_column, REQUIRED_COLUMNS};
use crate::db::{DbError, TableName};
use crate::model::record::{Record, RecordDraft, RecordId, RecordValidationError};
use log::warn;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(RecordValidationError),
    Db(DbError),
    MissingRequiredTable(String),
    MissingRequiredColumn {
        table: String,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column missing: {table}.{column}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for record CRUD operations.
pub trait RecordRepository {
    /// Inserts a new row and returns its fresh id.
    fn insert_record(&self, draft: &RecordDraft) -> RepoResult<RecordId>;
    /// Replaces name/email of `id`. Returns `false` when no row matched.
    fn update_record(&self, id: RecordId, draft: &RecordDraft) -> RepoResult<bool>;
    /// Deletes `id`. Returns `false` when no row matched.
    fn delete_record(&self, id: RecordId) -> RepoResult<bool>;
    fn get_record(&self, id: RecordId) -> RepoResult<Option<Record>>;
    fn list_records(&self) -> RepoResult<Vec<Record>>;
}

/// SQLite-backed record repository bound to one table.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
    table: &'conn TableName,
    select_sql: String,
}

impl<'conn> SqliteRecordRepository<'conn> {
    /// Constructs a repository over a provisioned table.
    ///
    /// Fails when the table or one of its required columns is missing.
    pub fn try_new(conn: &'conn Connection, table: &'conn TableName) -> RepoResult<Self> {
        ensure_table_ready(conn, table)?;
        Ok(Self {
            conn,
            table,
            select_sql: format!("SELECT id, name, email FROM {table}"),
        })
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn insert_record(&self, draft: &RecordDraft) -> RepoResult<RecordId> {
        draft.validate()?;

        self.conn.execute(
            &format!("INSERT INTO {} (name, email) VALUES (?1, ?2);", self.table),
            params![draft.name.as_str(), draft.email.as_str()],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_record(&self, id: RecordId, draft: &RecordDraft) -> RepoResult<bool> {
        draft.validate()?;

        let changed = self.conn.execute(
            &format!(
                "UPDATE {}
                 SET name = ?1, email = ?2
                 WHERE id = ?3;",
                self.table
            ),
            params![draft.name.as_str(), draft.email.as_str(), id],
        )?;

        Ok(changed > 0)
    }

    fn delete_record(&self, id: RecordId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?1;", self.table), [id])?;
        Ok(changed > 0)
    }

    fn get_record(&self, id: RecordId) -> RepoResult<Option<Record>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?1;", self.select_sql))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => parse_record_row(row, self.table),
            None => Ok(None),
        }
    }

    fn list_records(&self) -> RepoResult<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY id ASC;", self.select_sql))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.extend(parse_record_row(row, self.table)?);
        }
        Ok(records)
    }
}

/// Maps a row to a record; `None` for a row whose id is not positive.
fn parse_record_row(row: &Row<'_>, table: &TableName) -> RepoResult<Option<Record>> {
    let id: RecordId = row.get("id")?;
    if id <= 0 {
        warn!(
            "event=record_read module=repo status=skipped table={} id={} reason=non_positive_id",
            table, id
        );
        return Ok(None);
    }
    // name/email are returned as stored, even when they fail write validation.
    Ok(Some(Record {
        id,
        name: row.get("name")?,
        email: row.get("email")?,
    }))
}

fn ensure_table_ready(conn: &Connection, table: &TableName) -> RepoResult<()> {
    if !table_exists(conn, table.as_str())? {
        return Err(RepoError::MissingRequiredTable(table.to_string()));
    }
    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, table.as_str(), column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: table.to_string(),
                column,
            });
        }
    }
    Ok(())
}
