#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Durable incident store backed by `SQLite`.
//!
//! The single source of truth for incidents. Append-only: the only
//! permitted mutation is the classification transition, implemented as a
//! compare-and-set so concurrent classification attempts (the original
//! pass racing a retry) can never corrupt a record or double-apply.
//!
//! Uses `switchy_database` for all database operations, following the same
//! patterns as the rest of the workspace. Feed reads paginate with an
//! opaque keyset cursor over `(created_at, id)` so concurrent inserts
//! never shift a client's pagination window.

pub mod cursor;
pub mod queries;

use std::path::Path;
use std::sync::Mutex;

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;
use thiserror::Error;

/// Default path for the incident database.
pub const DEFAULT_DB_PATH: &str = "data/safehaven.db";

/// Errors from incident store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An insert collided with an existing `id`.
    ///
    /// Server-assigned ids make this unreachable in practice, but the
    /// contract guards it so an id-generation defect surfaces loudly
    /// instead of overwriting a record.
    #[error("Incident {id} already exists")]
    Conflict {
        /// The conflicting incident id.
        id: i64,
    },

    /// The incident id is unknown.
    #[error("Incident {id} not found")]
    NotFound {
        /// The missing incident id.
        id: i64,
    },

    /// A feed cursor could not be decoded or did not match the query.
    #[error("Invalid cursor: {0}")]
    Cursor(#[from] cursor::CursorError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opens (or creates) the incident `SQLite` database and ensures the
/// schema exists.
///
/// # Errors
///
/// Returns [`StoreError`] if the database cannot be opened or schema
/// creation fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| StoreError::Database(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Opens an in-memory database with the schema applied. Used by tests and
/// available for ephemeral deployments.
///
/// # Errors
///
/// Returns [`StoreError`] if the database cannot be opened or schema
/// creation fails.
pub async fn open_in_memory() -> Result<Box<dyn Database>, StoreError> {
    let db = init_sqlite_rusqlite(None).map_err(|e| StoreError::Database(e.to_string()))?;
    ensure_schema(db.as_ref()).await?;
    Ok(db)
}

/// Creates all tables if they don't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), StoreError> {
    // AUTOINCREMENT (not the plain rowid) guarantees ids are never reused,
    // even across process restarts.
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS incidents (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            category          TEXT NOT NULL,
            description       TEXT NOT NULL,
            photo_ref         TEXT,
            photo_mime        TEXT,
            location          TEXT,
            risk              INTEGER,
            confidence        REAL,
            rationale         TEXT,
            status            TEXT NOT NULL,
            created_at_micros INTEGER NOT NULL
        )",
    )
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_incidents_recency
         ON incidents (created_at_micros DESC, id DESC)",
    )
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_incidents_status
         ON incidents (status)",
    )
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(())
}

/// Last issued creation timestamp, guarding the `created_at` monotonicity
/// invariant across concurrent submissions.
static LAST_CREATED_AT_MICROS: Mutex<i64> = Mutex::new(0);

/// Returns the next creation timestamp in microseconds since the epoch.
///
/// Never decreases, even if the wall clock steps backwards. Equal values
/// for back-to-back inserts are fine: feed ordering breaks ties by `id`.
///
/// # Panics
///
/// Panics if the clock mutex is poisoned.
pub(crate) fn next_created_at_micros() -> i64 {
    let now = chrono::Utc::now().timestamp_micros();
    let mut last = LAST_CREATED_AT_MICROS
        .lock()
        .expect("created_at clock mutex poisoned");
    let next = now.max(*last);
    *last = next;
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_at_clock_never_decreases() {
        let mut previous = next_created_at_micros();
        for _ in 0..1000 {
            let current = next_created_at_micros();
            assert!(current >= previous);
            previous = current;
        }
    }
}
