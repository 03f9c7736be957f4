//! Wall-clock helpers used by the timetable queries.
//!
//! Stored start/end values are times of day. To compare them against "now"
//! they are anchored to the date of the current moment and projected onto a
//! millisecond instant. Wall-clock values are read as if they were UTC, both
//! for stored times and for `now`, so the comparison never depends on the
//! server's timezone offset.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Milliseconds in one hour.
pub const MS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Formats tried, in order, when a stored value only carries a time of day.
const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

/// Formats tried when a stored value carries a full date and time. The date
/// part is dropped.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at a single moment.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Projects a time of day onto `reference` and returns milliseconds since the
/// Unix epoch.
///
/// Callers must pass the date of the moment they compare against, so that
/// stored values and [`now_instant`] share the same anchor.
pub fn to_instant(time: NaiveTime, reference: NaiveDate) -> i64 {
    reference.and_time(time).and_utc().timestamp_millis()
}

/// The instant of `now`, using the same projection as [`to_instant`].
pub fn now_instant(now: NaiveDateTime) -> i64 {
    now.and_utc().timestamp_millis()
}

/// Formats an instant for log output.
pub fn to_human(instant: i64) -> String {
    match DateTime::from_timestamp_millis(instant) {
        Some(dt) => dt.format("%A %Y-%m-%d %H:%M:%S").to_string(),
        None => format!("{instant}ms"),
    }
}

/// Parses a stored start/end value into a time of day.
///
/// Accepts bare times (`09:00`, `09:00:00`, `09:00:00.000`) as well as full
/// date-times, in which case only the time part is kept.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
    let raw = raw.trim();

    for fmt in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(raw, fmt) {
            return Ok(time);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.time());
        }
    }

    DateTime::parse_from_rfc3339(raw).map(|dt| dt.naive_local().time())
}
