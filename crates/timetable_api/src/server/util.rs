use axum::{
    extract::{rejection::QueryRejection, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::Day;
use crate::server::types::ApiErrorType;
use crate::service::ServiceResult;

/// Renders a query result. Successful results are sent as-is under their
/// status; anything else becomes the generic server error body.
pub fn service_response<T: Serialize>(result: ServiceResult<T>) -> Response {
    if !result.is_success() {
        return ApiErrorType::server_error().into_response();
    }

    let status = StatusCode::from_u16(result.status).unwrap_or(StatusCode::OK);
    (status, Json(result)).into_response()
}

/// Widest `courses-within` window, in hours either side of now.
pub const MAX_WINDOW_HOURS: f64 = 24.0;

/// Unwraps extracted query parameters, turning a malformed query string into
/// a 400 with the JSON error body.
pub fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiErrorType> {
    params.map(|Query(p)| p).map_err(|rejection| {
        ApiErrorType::from((
            StatusCode::BAD_REQUEST,
            "Invalid query string",
            Some(rejection.body_text()),
        ))
    })
}

/// Validates the `hours` query parameter: a number from 0 to
/// [`MAX_WINDOW_HOURS`].
pub fn parse_hours(raw: Option<&str>) -> Result<f64, ApiErrorType> {
    let invalid = |details: String| {
        ApiErrorType::from((StatusCode::BAD_REQUEST, "Invalid hours parameter", Some(details)))
    };

    let raw = raw.ok_or_else(|| invalid("hours is required".to_string()))?;
    let hours = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid(format!("'{raw}' is not a number")))?;

    if !(0.0..=MAX_WINDOW_HOURS).contains(&hours) {
        return Err(invalid(format!(
            "hours must be between 0 and {MAX_WINDOW_HOURS}, got '{raw}'"
        )));
    }

    Ok(hours)
}

/// Validates the `day` query parameter: one of the seven weekday names.
pub fn parse_day(raw: Option<&str>) -> Result<Day, ApiErrorType> {
    let invalid = |details: String| {
        ApiErrorType::from((StatusCode::BAD_REQUEST, "Invalid day parameter", Some(details)))
    };

    raw.ok_or_else(|| invalid("day is required".to_string()))?
        .parse::<Day>()
        .map_err(|e| invalid(e.to_string()))
}
