//! Timetable query endpoints.
//!
//! Each handler extracts its query parameters, runs the matching
//! [`TimetableService`](crate::service::TimetableService) operation and
//! renders the returned status and payload.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::server::types::{CourseScheduleQuery, LocationQuery, WithinQuery};
use crate::server::util::{parse_day, parse_hours, query_params, service_response};
use crate::types::AppState;

/// GET /timetable/locations
/// Returns every location that has a room assigned
pub async fn get_locations(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /timetable/locations");
    service_response(s.timetable.get_all_locations().await)
}

/// GET /timetable/courses-today?location=
pub async fn get_courses_today(
    State(s): State<Arc<AppState>>,
    params: Result<Query<LocationQuery>, QueryRejection>,
) -> Response {
    let params = match query_params(params) {
        Ok(params) => params,
        Err(e) => {
            warn!("Rejected query string: {:?}", e);
            return e.into_response();
        }
    };
    info!("GET /timetable/courses-today (location={})", params.location);
    service_response(s.timetable.courses_today(&params.location).await)
}

/// GET /timetable/courses-right-now?location=
pub async fn get_courses_right_now(
    State(s): State<Arc<AppState>>,
    params: Result<Query<LocationQuery>, QueryRejection>,
) -> Response {
    let params = match query_params(params) {
        Ok(params) => params,
        Err(e) => {
            warn!("Rejected query string: {:?}", e);
            return e.into_response();
        }
    };
    info!("GET /timetable/courses-right-now (location={})", params.location);
    service_response(s.timetable.courses_right_now(&params.location).await)
}

/// GET /timetable/available-right-now
/// Returns the locations with nothing in progress
pub async fn get_available_right_now(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /timetable/available-right-now");
    service_response(s.timetable.available_right_now().await)
}

/// GET /timetable/courses-within?location=&hours=
///
/// Rejects a missing or non-numeric `hours`, or one outside 0..=24, with 400.
pub async fn get_courses_within(
    State(s): State<Arc<AppState>>,
    params: Result<Query<WithinQuery>, QueryRejection>,
) -> Response {
    let params = match query_params(params) {
        Ok(params) => params,
        Err(e) => {
            warn!("Rejected query string: {:?}", e);
            return e.into_response();
        }
    };
    info!(
        "GET /timetable/courses-within (location={}, hours={:?})",
        params.location, params.hours
    );

    let hours = match parse_hours(params.hours.as_deref()) {
        Ok(hours) => hours,
        Err(e) => {
            warn!("Rejected courses-within request: {:?}", e);
            return e.into_response();
        }
    };

    service_response(
        s.timetable
            .courses_within_n_hours(&params.location, hours)
            .await,
    )
}

/// GET /timetable/courses
/// Returns every distinct course/section pair
pub async fn get_courses_and_sections(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /timetable/courses");
    service_response(s.timetable.all_courses_and_sections().await)
}

/// GET /timetable/course-schedule?course=&day=&section=
pub async fn get_course_schedule(
    State(s): State<Arc<AppState>>,
    params: Result<Query<CourseScheduleQuery>, QueryRejection>,
) -> Response {
    let params = match query_params(params) {
        Ok(params) => params,
        Err(e) => {
            warn!("Rejected query string: {:?}", e);
            return e.into_response();
        }
    };
    info!(
        "GET /timetable/course-schedule (course={}, day={:?}, section={})",
        params.course, params.day, params.section
    );

    let day = match parse_day(params.day.as_deref()) {
        Ok(day) => day,
        Err(e) => {
            warn!("Rejected course-schedule request: {:?}", e);
            return e.into_response();
        }
    };

    service_response(
        s.timetable
            .course_schedule(&params.course, day, &params.section)
            .await,
    )
}
