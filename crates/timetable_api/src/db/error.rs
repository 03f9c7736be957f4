//! Error types for the timetable store.

use thiserror::Error;

/// Errors raised while reading from the timetable store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The query or connection failed inside SQLite
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A previous holder of the connection panicked
    #[error("Database connection lock poisoned")]
    LockPoisoned,
}
