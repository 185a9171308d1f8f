//! Record table provisioning.
//!
//! # Responsibility
//! - Create the record table when it does not exist.
//! - Verify an existing table carries the columns core relies on.
//!
//! # Invariants
//! - Provisioning is idempotent and never drops or rewrites data.
//! - A table missing a required column is an error, not silently patched.

use crate::db::{DbError, DbResult, TableName};
use log::info;
use rusqlite::Connection;

const RECORDS_TABLE_SQL: &str = include_str!("sql/records_table.sql");

/// Columns every record table must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["id", "name", "email"];

/// Ensures the record table exists and is compatible.
pub fn provision(conn: &Connection, table: &TableName) -> DbResult<()> {
    let existed = table_exists(conn, table.as_str())?;
    if !existed {
        conn.execute_batch(&RECORDS_TABLE_SQL.replace("{table}", table.as_str()))?;
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, table.as_str(), column)? {
            return Err(DbError::IncompatibleTable {
                table: table.to_string(),
                missing_column: column,
            });
        }
    }

    info!(
        "event=schema_provision module=db status=ok table={} created={}",
        table,
        !existed
    );
    Ok(())
}

/// Returns whether a table with this exact name exists.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Returns whether `table` has a column named `column`.
pub fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let mut rows = stmt.query([table])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(0)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
