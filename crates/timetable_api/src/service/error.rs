//! Error types for the timetable query layer.

use thiserror::Error;

use crate::db::StoreError;

/// Failures that can occur while answering a timetable query.
///
/// Never shown to API callers; every variant becomes a 500 response.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The store could not be queried
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The blocking task running a store query panicked or was cancelled
    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
