use crate::service::TimetableService;

/// State shared by every request handler.
pub struct AppState {
    pub timetable: TimetableService,
}

impl AppState {
    pub fn new(timetable: TimetableService) -> Self {
        Self { timetable }
    }
}
