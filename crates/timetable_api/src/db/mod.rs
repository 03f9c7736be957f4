/// Database module for reading timetable data

mod error;
mod types;

pub use error::StoreError;
pub use types::{CourseSection, Day, TimetableEntry, UnknownDay};

use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::time::parse_time_of_day;

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_timetable.sql");

const ENTRY_COLUMNS: &str =
    "day, period_name, start_time, end_time, location, course_code, section";

/// Read-only queries over the timetable table.
///
/// Implementations return the full matching row set and never retry.
pub trait TimetableStore: Send + Sync {
    /// Distinct locations, ascending.
    fn list_locations(&self) -> Result<Vec<String>, StoreError>;

    /// Distinct course/section pairs, ascending by course code.
    fn list_courses_and_sections(&self) -> Result<Vec<CourseSection>, StoreError>;

    /// Every row held at `location`.
    fn list_by_location(&self, location: &str) -> Result<Vec<TimetableEntry>, StoreError>;

    /// Every row for the given course section on `day`.
    fn list_by_course_day_section(
        &self,
        course: &str,
        day: Day,
        section: &str,
    ) -> Result<Vec<TimetableEntry>, StoreError>;
}

pub struct TimetableDbManager {
    db: Mutex<Connection>,
}

impl TimetableDbManager {
    /// Opens the SQLite database at `db_path` and makes sure the timetable
    /// table exists.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(db_path)?)
    }

    /// Opens an empty in-memory database with the timetable table.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.db.lock().map_err(|_| StoreError::LockPoisoned)
    }

    #[cfg(test)]
    pub(crate) fn insert_entry(&self, entry: &TimetableEntry) -> Result<(), StoreError> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO timetable (
                day, period_name, start_time, end_time, location, course_code, section
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                entry.day.as_str(),
                &entry.period_name,
                entry.start_time.format("%H:%M:%S").to_string(),
                entry.end_time.format("%H:%M:%S").to_string(),
                &entry.location,
                &entry.course_code,
                &entry.section,
            ),
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<(), StoreError> {
        self.conn()?.execute_batch(sql)?;
        Ok(())
    }
}

impl TimetableStore for TimetableDbManager {
    fn list_locations(&self) -> Result<Vec<String>, StoreError> {
        let db = self.conn()?;
        let mut stmt =
            db.prepare("SELECT DISTINCT location FROM timetable ORDER BY location")?;

        let locations = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(locations)
    }

    fn list_courses_and_sections(&self) -> Result<Vec<CourseSection>, StoreError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT DISTINCT course_code, section
             FROM timetable
             ORDER BY course_code, section",
        )?;

        let pairs = stmt
            .query_map([], |row| {
                Ok(CourseSection {
                    course: row.get(0)?,
                    section: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pairs)
    }

    fn list_by_location(&self, location: &str) -> Result<Vec<TimetableEntry>, StoreError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM timetable WHERE location = ? ORDER BY rowid"
        ))?;

        let entries = stmt
            .query_map([location], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn list_by_course_day_section(
        &self,
        course: &str,
        day: Day,
        section: &str,
    ) -> Result<Vec<TimetableEntry>, StoreError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM timetable
             WHERE course_code = ?1 AND day = ?2 AND section = ?3
             ORDER BY rowid"
        ))?;

        let entries = stmt
            .query_map((course, day.as_str(), section), entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}

/// Maps a row selected with [`ENTRY_COLUMNS`] onto a [`TimetableEntry`].
fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<TimetableEntry> {
    let day: String = row.get(0)?;
    let start_time: String = row.get(2)?;
    let end_time: String = row.get(3)?;

    Ok(TimetableEntry {
        day: day.parse().map_err(|e| conversion_failure(0, e))?,
        period_name: row.get(1)?,
        start_time: parse_time_of_day(&start_time).map_err(|e| conversion_failure(2, e))?,
        end_time: parse_time_of_day(&end_time).map_err(|e| conversion_failure(3, e))?,
        location: row.get(4)?,
        course_code: row.get(5)?,
        section: row.get(6)?,
    })
}

fn conversion_failure<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}
