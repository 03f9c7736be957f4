use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::server::types::ApiErrorType;

/// GET /health
pub async fn get_health() -> Response {
    (StatusCode::OK, "Up").into_response()
}

/// GET /info
pub async fn get_info() -> Response {
    (StatusCode::OK, "Timetable API").into_response()
}

/// Any unknown path.
pub async fn not_found(uri: Uri) -> Response {
    warn!("No route for {}", uri.path());
    ApiErrorType::from((StatusCode::NOT_FOUND, "Not found", None)).into_response()
}
