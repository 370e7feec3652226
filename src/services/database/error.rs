//! Error taxonomy for test-database operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the test-database layer.
///
/// Engine failures during ad-hoc query execution are *not* represented
/// here; they are captured into `QueryExecutionResult::Error` so the UI
/// can render them inline. This enum covers the typed contract around the
/// handle itself: filesystem problems, invalid files, and use-after-close.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Filesystem-level failure (unwritable path, missing file, ...).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but is not a SQLite database.
    #[error("{} is not a SQLite database", path.display())]
    NotADatabase { path: PathBuf },

    /// The handle was closed; reopen the database to keep working with it.
    #[error("database handle is closed")]
    ClosedHandle,

    /// Engine error from introspection or administrative statements.
    #[error(transparent)]
    Engine(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Whether this error is a use-after-close.
    pub fn is_closed_handle(&self) -> bool {
        matches!(self, DatabaseError::ClosedHandle)
    }
}
