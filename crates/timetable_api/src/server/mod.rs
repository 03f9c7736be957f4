use std::any::Any;
use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::server::endpoints::{status, timetable};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

mod endpoints;
mod types;
mod util;

/// Headers added to every response unless a handler already set them.
const SECURITY_HEADERS: [(HeaderName, &str); 3] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    (header::REFERRER_POLICY, "no-referrer"),
];

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let timetable_router = Router::new()
        .route("/locations", get(timetable::get_locations))
        .route("/courses-today", get(timetable::get_courses_today))
        .route("/courses-right-now", get(timetable::get_courses_right_now))
        .route(
            "/available-right-now",
            get(timetable::get_available_right_now),
        )
        .route("/courses-within", get(timetable::get_courses_within))
        .route("/courses", get(timetable::get_courses_and_sections))
        .route("/course-schedule", get(timetable::get_course_schedule));

    let router = Router::new()
        .route("/health", get(status::get_health))
        .route("/info", get(status::get_info))
        .nest("/timetable", timetable_router)
        .fallback(status::not_found)
        .with_state(app_state)
        .layer(CatchPanicLayer::custom(handle_panic));

    SECURITY_HEADERS
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(
                name,
                HeaderValue::from_static(value),
            ))
        })
        .layer(TraceLayer::new_for_http())
}

/// Turns a panicking handler into the generic 500 response.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };

    error!("Handler panicked: {}", details);
    ApiErrorType::server_error().into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Day, TimetableDbManager, TimetableEntry};
    use crate::service::TimetableService;
    use crate::time::FixedClock;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Wednesday 2024-03-06 10:30:00
    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 6)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    fn entry(location: &str, start: u32, end: u32) -> TimetableEntry {
        TimetableEntry {
            day: Day::Wednesday,
            period_name: "Lecture".to_string(),
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
            location: location.to_string(),
            course_code: "CS101".to_string(),
            section: "A".to_string(),
        }
    }

    fn router_with(entries: &[TimetableEntry]) -> Router {
        let db = TimetableDbManager::open_in_memory().unwrap();
        for e in entries {
            db.insert_entry(e).unwrap();
        }
        let service = TimetableService::new(Arc::new(db), Arc::new(FixedClock(now())));
        create_router(Arc::new(AppState::new(service)))
    }

    fn broken_router() -> Router {
        let db = TimetableDbManager::open_in_memory().unwrap();
        db.execute_raw("DROP TABLE timetable").unwrap();
        let service = TimetableService::new(Arc::new(db), Arc::new(FixedClock(now())));
        create_router(Arc::new(AppState::new(service)))
    }

    async fn send(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_headers(router: Router, uri: &str) -> axum::http::HeaderMap {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .headers()
            .clone()
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = send(router, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_and_info() {
        let (status, body) = send(router_with(&[]), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Up");

        let (status, body) = send(router_with(&[]), "/info").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Timetable API");
    }

    #[tokio::test]
    async fn test_locations() {
        let router = router_with(&[
            entry("Room A", 8, 9),
            entry("OT", 8, 9),
            entry(" - ", 8, 9),
        ]);
        let (status, body) = get_json(router, "/timetable/locations").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": 200, "data": ["Room A"] }));
    }

    #[tokio::test]
    async fn test_courses_right_now_and_available() {
        let router = router_with(&[entry("L1", 10, 11), entry("L2", 12, 13)]);

        let (status, body) =
            get_json(router.clone(), "/timetable/courses-right-now?location=L1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!([{
                "day": "Wednesday",
                "periodName": "Lecture",
                "startTime": "10:00:00",
                "endTime": "11:00:00",
                "location": "L1",
                "courseCode": "CS101",
                "section": "A",
            }])
        );

        let (_, body) = get_json(router, "/timetable/available-right-now").await;
        assert_eq!(body, json!({ "status": 200, "data": ["L2"] }));
    }

    #[tokio::test]
    async fn test_courses_today_with_encoded_location() {
        let router = router_with(&[entry("Room A", 8, 9)]);
        let (status, body) =
            get_json(router, "/timetable/courses-today?location=Room%20A").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_location_is_empty_result() {
        let router = router_with(&[entry("Room A", 8, 9)]);
        let (status, body) = get_json(router, "/timetable/courses-today").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": 200, "data": [] }));
    }

    #[tokio::test]
    async fn test_courses_within() {
        let router = router_with(&[entry("L1", 9, 11), entry("L1", 13, 14)]);
        let (status, body) =
            get_json(router, "/timetable/courses-within?location=L1&hours=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["startTime"], "09:00:00");
        assert_eq!(body["extra"]["to"], "Wednesday 2024-03-06 12:30:00");
    }

    #[tokio::test]
    async fn test_courses_within_rejects_bad_hours() {
        for uri in [
            "/timetable/courses-within?location=L1&hours=abc",
            "/timetable/courses-within?location=L1&hours=-2",
            "/timetable/courses-within?location=L1",
        ] {
            let (status, body) = get_json(router_with(&[]), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["msg"], "Invalid hours parameter");
        }
    }

    #[tokio::test]
    async fn test_courses_and_schedule() {
        let router = router_with(&[entry("L1", 9, 11)]);

        let (_, body) = get_json(router.clone(), "/timetable/courses").await;
        assert_eq!(
            body,
            json!({ "status": 200, "data": [{ "course": "CS101", "section": "A" }] })
        );

        let (status, body) = get_json(
            router.clone(),
            "/timetable/course-schedule?course=CS101&day=wednesday&section=A",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = get_json(
            router,
            "/timetable/course-schedule?course=CS101&day=someday&section=A",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "Invalid day parameter");
    }

    #[tokio::test]
    async fn test_store_failure_is_generic_500() {
        for uri in [
            "/timetable/locations",
            "/timetable/courses-today?location=L1",
            "/timetable/courses-right-now?location=L1",
            "/timetable/available-right-now",
            "/timetable/courses-within?location=L1&hours=1",
            "/timetable/courses",
            "/timetable/course-schedule?course=C&day=Monday&section=A",
        ] {
            let (status, body) = get_json(broken_router(), uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(body, json!({ "msg": "Server error!" }));
        }
    }

    #[tokio::test]
    async fn test_malformed_query_string_is_json_error() {
        for uri in [
            "/timetable/courses-within?location=L1&hours=1&hours=2",
            "/timetable/courses-today?location=A&location=B",
            "/timetable/course-schedule?course=C&day=Monday&day=Friday&section=A",
        ] {
            let (status, body) = get_json(router_with(&[]), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["msg"], "Invalid query string", "{uri}");
            assert!(body["details"].as_str().unwrap().contains("duplicate field"));
        }
    }

    #[tokio::test]
    async fn test_courses_within_rejects_oversized_window() {
        for hours in ["25", "1e308"] {
            let uri = format!("/timetable/courses-within?location=L1&hours={hours}");
            let (status, body) = get_json(router_with(&[]), &uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["msg"], "Invalid hours parameter");
        }

        let (status, body) =
            get_json(router_with(&[]), "/timetable/courses-within?location=L1&hours=24").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["extra"]["from"], "Tuesday 2024-03-05 10:30:00");
        assert_eq!(body["extra"]["to"], "Thursday 2024-03-07 10:30:00");
    }

    #[tokio::test]
    async fn test_security_headers() {
        for router in [router_with(&[]), broken_router()] {
            for uri in ["/health", "/timetable/locations", "/nope"] {
                let headers = get_headers(router.clone(), uri).await;
                assert_eq!(headers["x-content-type-options"], "nosniff", "{uri}");
                assert_eq!(headers["x-frame-options"], "SAMEORIGIN", "{uri}");
                assert_eq!(headers["referrer-policy"], "no-referrer", "{uri}");
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, body) = get_json(router_with(&[]), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "msg": "Not found" }));
    }

    #[tokio::test]
    async fn test_panicking_handler_is_generic_500() {
        async fn boom() -> Response {
            panic!("boom")
        }

        let router = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));
        let (status, body) = get_json(router, "/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "msg": "Server error!" }));
    }
}
