//! SQLite connection bootstrap.
//!
//! # Invariants
//! - A returned connection has the record table provisioned and verified.
//! - Every open attempt ends in exactly one `db_open` ok/error event.

use super::schema::provision;
use super::{DbError, DbResult, TableName};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if missing) a database file and provisions `table`.
pub fn open_db(path: impl AsRef<Path>, table: &TableName) -> DbResult<Connection> {
    open_with("file", table, || Connection::open(path))
}

/// Opens a private in-memory database and provisions `table`.
pub fn open_db_in_memory(table: &TableName) -> DbResult<Connection> {
    open_with("memory", table, Connection::open_in_memory)
}

fn open_with(
    mode: &str,
    table: &TableName,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let opened = open().map_err(|err| ("db_open_failed", DbError::from(err)));
    let result = opened.and_then(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(DbError::from)
            .and_then(|()| provision(&conn, table))
            .map(|()| conn)
            .map_err(|err| ("db_provision_failed", err))
    });
    let elapsed_ms = started_at.elapsed().as_millis();

    match result {
        Ok(conn) => {
            info!(
                "event=db_open module=db status=ok mode={mode} table={table} duration_ms={elapsed_ms}"
            );
            Ok(conn)
        }
        Err((error_code, err)) => {
            error!(
                "event=db_open module=db status=error mode={mode} table={table} duration_ms={elapsed_ms} error_code={error_code} error={err}"
            );
            Err(err)
        }
    }
}
