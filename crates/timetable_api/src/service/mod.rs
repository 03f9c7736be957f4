//! Timetable queries: what is on today, right now, and within a window of
//! hours at a location, and which locations are free.
//!
//! Each public operation reads the clock once, queries the store on the
//! blocking pool, and filters the rows in memory. Failures never escape this
//! layer; they are logged with the route name and returned as a 500
//! [`ServiceResult`].

mod error;
mod types;

pub use error::ServiceError;
pub use types::ServiceResult;

use chrono::{Datelike, NaiveDateTime};
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::{CourseSection, Day, StoreError, TimetableEntry, TimetableStore};
use crate::time::{now_instant, to_human, to_instant, Clock, MS_PER_HOUR};
use types::handle_server_error;

/// Location values meaning "no room assigned".
pub const SENTINEL_LOCATIONS: [&str; 2] = [" - ", "OT"];

pub fn is_sentinel_location(location: &str) -> bool {
    SENTINEL_LOCATIONS.contains(&location)
}

/// Keeps the entries in progress at `now`. Both ends are inclusive.
pub fn in_progress_at(entries: Vec<TimetableEntry>, now: NaiveDateTime) -> Vec<TimetableEntry> {
    let instant = now_instant(now);
    let today = now.date();

    entries
        .into_iter()
        .filter(|e| {
            to_instant(e.start_time, today) <= instant && instant <= to_instant(e.end_time, today)
        })
        .collect()
}

/// Keeps the entries that start no earlier than `now - window_ms` and end no
/// later than `now + window_ms`.
pub fn within_window(
    entries: Vec<TimetableEntry>,
    now: NaiveDateTime,
    window_ms: i64,
) -> Vec<TimetableEntry> {
    let instant = now_instant(now);
    let lower = instant.saturating_sub(window_ms);
    let upper = instant.saturating_add(window_ms);
    let today = now.date();

    entries
        .into_iter()
        .filter(|e| {
            to_instant(e.start_time, today) >= lower && to_instant(e.end_time, today) <= upper
        })
        .collect()
}

/// Converts a possibly fractional number of hours into whole milliseconds.
pub fn hours_to_ms(hours: f64) -> i64 {
    (hours * MS_PER_HOUR as f64).round() as i64
}

pub struct TimetableService {
    store: Arc<dyn TimetableStore>,
    clock: Arc<dyn Clock>,
}

impl TimetableService {
    pub fn new(store: Arc<dyn TimetableStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// All locations with a room assigned, ascending.
    pub async fn get_all_locations(&self) -> ServiceResult<Vec<String>> {
        match self.locations().await {
            Ok(locations) => ServiceResult::ok(locations),
            Err(e) => handle_server_error(e, "/timetable/locations"),
        }
    }

    /// Entries at `location` that meet on today's weekday.
    pub async fn courses_today(&self, location: &str) -> ServiceResult<Vec<TimetableEntry>> {
        let now = self.clock.now();
        info!("Today is {}", Day::from(now.weekday()));

        match self.today_at(location, now).await {
            Ok(entries) => ServiceResult::ok(entries),
            Err(e) => handle_server_error(e, "/timetable/courses-today"),
        }
    }

    /// Entries at `location` in progress at this moment.
    pub async fn courses_right_now(&self, location: &str) -> ServiceResult<Vec<TimetableEntry>> {
        let now = self.clock.now();
        log_now(now);

        match self.right_now_at(location, now).await {
            Ok(entries) => ServiceResult::ok(entries),
            Err(e) => handle_server_error(e, "/timetable/courses-right-now"),
        }
    }

    /// Locations with nothing in progress at this moment, in the order
    /// [`get_all_locations`](Self::get_all_locations) lists them.
    pub async fn available_right_now(&self) -> ServiceResult<Vec<String>> {
        let now = self.clock.now();
        log_now(now);

        match self.available_at(now).await {
            Ok(locations) => ServiceResult::ok(locations),
            Err(e) => handle_server_error(e, "/timetable/available-right-now"),
        }
    }

    /// Today's entries at `location` that fit inside `now ± hours`.
    ///
    /// `extra` carries the window bounds in readable form.
    pub async fn courses_within_n_hours(
        &self,
        location: &str,
        hours: f64,
    ) -> ServiceResult<Vec<TimetableEntry>> {
        let now = self.clock.now();
        log_now(now);

        let window_ms = hours_to_ms(hours);
        let instant = now_instant(now);
        debug!(hours, window_ms, "Computed window");

        match self.today_at(location, now).await {
            Ok(entries) => ServiceResult::ok(within_window(entries, now, window_ms)).with_extra(
                json!({
                    "from": to_human(instant.saturating_sub(window_ms)),
                    "to": to_human(instant.saturating_add(window_ms)),
                }),
            ),
            Err(e) => handle_server_error(e, "/timetable/courses-within"),
        }
    }

    /// Every distinct course/section pair.
    pub async fn all_courses_and_sections(&self) -> ServiceResult<Vec<CourseSection>> {
        match self.query(|store| store.list_courses_and_sections()).await {
            Ok(pairs) => ServiceResult::ok(pairs),
            Err(e) => handle_server_error(e, "/timetable/courses"),
        }
    }

    /// The meetings of one course section on `day`.
    pub async fn course_schedule(
        &self,
        course: &str,
        day: Day,
        section: &str,
    ) -> ServiceResult<Vec<TimetableEntry>> {
        let course = course.to_string();
        let section = section.to_string();

        match self
            .query(move |store| store.list_by_course_day_section(&course, day, &section))
            .await
        {
            Ok(entries) => ServiceResult::ok(entries),
            Err(e) => handle_server_error(e, "/timetable/course-schedule"),
        }
    }

    /// Runs a store query on the blocking pool.
    async fn query<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn TimetableStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let rows = tokio::task::spawn_blocking(move || f(&*store)).await??;
        Ok(rows)
    }

    async fn locations(&self) -> Result<Vec<String>, ServiceError> {
        let mut locations = self.query(|store| store.list_locations()).await?;
        locations.retain(|l| !is_sentinel_location(l));
        Ok(locations)
    }

    async fn today_at(
        &self,
        location: &str,
        now: NaiveDateTime,
    ) -> Result<Vec<TimetableEntry>, ServiceError> {
        let today = Day::from(now.weekday());
        let location = location.to_string();

        let entries = self
            .query(move |store| store.list_by_location(&location))
            .await?;

        Ok(entries.into_iter().filter(|e| e.day == today).collect())
    }

    async fn right_now_at(
        &self,
        location: &str,
        now: NaiveDateTime,
    ) -> Result<Vec<TimetableEntry>, ServiceError> {
        let entries = self.today_at(location, now).await?;
        Ok(in_progress_at(entries, now))
    }

    async fn available_at(&self, now: NaiveDateTime) -> Result<Vec<String>, ServiceError> {
        let locations = self.locations().await?;
        let in_progress = join_all(locations.iter().map(|l| self.right_now_at(l, now))).await;

        let mut available = Vec::new();
        for (location, entries) in locations.into_iter().zip(in_progress) {
            if entries?.is_empty() {
                available.push(location);
            }
        }
        Ok(available)
    }
}

fn log_now(now: NaiveDateTime) {
    let instant = now_instant(now);
    info!("Time now is {}", to_human(instant));
    debug!("Unix time is {}", instant);
}
