//! The envelope every timetable query answers with.

use serde::Serialize;
use serde_json::Value;
use tracing::error;

use super::ServiceError;

/// Status code plus payload returned by every query.
///
/// `data` is `None` when the query failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceResult<T> {
    pub status: u16,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl<T> ServiceResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: 200,
            data: Some(data),
            extra: None,
        }
    }

    pub fn server_error() -> Self {
        Self {
            status: 500,
            data: None,
            extra: None,
        }
    }

    /// Attaches diagnostic data to the result.
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Logs a failed query against the route it was serving and returns the
/// generic 500 result.
pub(crate) fn handle_server_error<T>(err: ServiceError, route: &str) -> ServiceResult<T> {
    error!(route, error = %err, "Failed to answer timetable query");
    ServiceResult::server_error()
}
