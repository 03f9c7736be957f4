pub mod status;
pub mod timetable;
