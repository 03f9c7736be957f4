use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Message sent with every 500 response.
pub const SERVER_ERROR_MSG: &str = "Server error!";

/// JSON error body: `{ "msg": ..., "details": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiErrorType {
    #[serde(skip)]
    status: StatusCode,
    msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiErrorType {
    pub fn server_error() -> Self {
        Self::from((StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MSG, None))
    }
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, msg, details): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            msg: msg.to_string(),
            details,
        }
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// `?location=`. A missing location is queried as the empty string.
#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    #[serde(default)]
    pub location: String,
}

/// `?location=&hours=`. `hours` is validated by the handler.
#[derive(Debug, Deserialize)]
pub struct WithinQuery {
    #[serde(default)]
    pub location: String,
    pub hours: Option<String>,
}

/// `?course=&day=&section=`. `day` is validated by the handler.
#[derive(Debug, Deserialize)]
pub struct CourseScheduleQuery {
    #[serde(default)]
    pub course: String,
    pub day: Option<String>,
    #[serde(default)]
    pub section: String,
}
