//! Attendance reporting service.
//!
//! Read-only view over committed attendance facts.

use crate::model::attendance::AttendanceRecord;
use crate::repo::attendance_repo::AttendanceRepository;
use crate::repo::RepoResult;
use chrono::NaiveDate;

/// Default size of the undated "recent" listing.
pub const DEFAULT_RECENT_LIMIT: u32 = 100;
/// Upper clamp for the recent listing.
pub const RECENT_LIMIT_MAX: u32 = 1000;

/// Attendance listing facade.
pub struct AttendanceQuery<A: AttendanceRepository> {
    repo: A,
    recent_limit: u32,
}

impl<A: AttendanceRepository> AttendanceQuery<A> {
    pub fn new(repo: A) -> Self {
        Self {
            repo,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    /// Overrides the recent listing size, clamped to `1..=RECENT_LIMIT_MAX`.
    pub fn with_recent_limit(mut self, limit: u32) -> Self {
        self.recent_limit = limit.clamp(1, RECENT_LIMIT_MAX);
        self
    }

    pub fn recent_limit(&self) -> u32 {
        self.recent_limit
    }

    /// Lists attendance.
    ///
    /// # Contract
    /// - `Some(date)`: every record of that date, earliest scan first.
    /// - `None`: latest `recent_limit` records, newest date and time first.
    pub fn list(&self, filter_date: Option<NaiveDate>) -> RepoResult<Vec<AttendanceRecord>> {
        match filter_date {
            Some(date) => self.repo.list_for_date(date),
            None => self.repo.list_recent(self.recent_limit),
        }
    }
}
