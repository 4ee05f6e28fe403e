//! Attendance domain model.
//!
//! # Responsibility
//! - Define the immutable "student was present at this time" fact.
//! - Derive the calendar date that bounds the one-per-day rule.
//!
//! # Invariants
//! - At most one record exists per `(idno, date)`.
//! - `date` is always `time_in.date()`.
//! - Timestamps carry whole seconds only.
//! - The snapshot is copied from the directory at recording time.

use crate::model::student::{Student, StudentId, StudentProfile};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Storage format of `attendance.time_in`.
pub const TIME_IN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Storage and wire format of calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wire format of the time-of-day column in reports.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";

/// Auto-assigned attendance sequence id.
pub type AttendanceId = i64;

/// Persisted attendance fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: AttendanceId,
    pub idno: StudentId,
    /// Student fields as they were when the scan was accepted.
    #[serde(flatten)]
    pub snapshot: StudentProfile,
    /// Local wall-clock time of the scan.
    pub time_in: NaiveDateTime,
    /// Dedup key; equals `time_in.date()`.
    pub date: NaiveDate,
}

impl AttendanceRecord {
    /// Time-of-day rendering, e.g. `08:00:00`.
    pub fn time_of_day(&self) -> String {
        self.time_in.format(TIME_OF_DAY_FORMAT).to_string()
    }
}

/// Insert payload for a new attendance fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub idno: StudentId,
    pub snapshot: StudentProfile,
    pub time_in: NaiveDateTime,
}

impl NewAttendance {
    /// Snapshots `student` at `occurred_at`, truncated to whole seconds.
    pub fn for_student(student: &Student, occurred_at: NaiveDateTime) -> Self {
        Self {
            idno: student.idno.clone(),
            snapshot: student.profile.clone(),
            time_in: truncate_to_second(occurred_at),
        }
    }

    pub fn date(&self) -> NaiveDate {
        calendar_date(self.time_in)
    }
}

/// Calendar date of a local timestamp; the day turns over at local midnight.
pub fn calendar_date(occurred_at: NaiveDateTime) -> NaiveDate {
    occurred_at.date()
}

pub fn truncate_to_second(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}
