//! Request/response envelopes for the record and list operations.
//!
//! # Responsibility
//! - Define serializable shapes for scan and report callers.
//! - Run one operation per request against a pooled connection.
//!
//! # Invariants
//! - Each handler checks out exactly one connection and returns it before
//!   the response is handed back.
//! - Rejections (`duplicate`, `unknown`, `invalid`, `conflict`) are
//!   responses, not errors; only store failures are `Err`.

use crate::db::ConnectionPool;
use crate::model::attendance::{AttendanceRecord, DATE_FORMAT};
use crate::repo::attendance_repo::SqliteAttendanceRepository;
use crate::repo::student_repo::SqliteStudentRepository;
use crate::repo::{RepoError, RepoResult};
use crate::service::attendance_service::{duplicate_message, AttendanceError, AttendanceRecorder};
use crate::service::query_service::AttendanceQuery;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Scan request: the identifier read from the QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAttendanceRequest {
    pub idno: String,
}

/// Outcome category of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Recorded,
    Duplicate,
    Unknown,
    Invalid,
    /// Insert collided with a concurrent scan that could not be read back.
    Conflict,
}

/// One attendance row as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub id: i64,
    pub idno: String,
    pub lastname: String,
    pub firstname: String,
    pub course: String,
    pub level: String,
    /// `HH:MM:SS`.
    pub time: String,
    /// `YYYY-MM-DD`.
    pub date: String,
}

impl From<&AttendanceRecord> for AttendanceRow {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            id: record.id,
            idno: record.idno.clone(),
            lastname: record.snapshot.lastname.clone(),
            firstname: record.snapshot.firstname.clone(),
            course: record.snapshot.course.clone(),
            level: record.snapshot.level.clone(),
            time: record.time_of_day(),
            date: record.date.format(DATE_FORMAT).to_string(),
        }
    }
}

/// Scan response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAttendanceResponse {
    pub status: RecordStatus,
    pub message: String,
    /// Inserted record for `recorded`, the existing one for `duplicate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<AttendanceRow>,
}

impl RecordAttendanceResponse {
    /// Folds a recorder result into a response; store failures stay `Err`.
    pub fn from_result(
        result: Result<AttendanceRecord, AttendanceError>,
    ) -> Result<Self, AttendanceError> {
        match result {
            Ok(record) => Ok(Self {
                status: RecordStatus::Recorded,
                message: "Attendance recorded successfully!".to_string(),
                snapshot: Some(AttendanceRow::from(&record)),
            }),
            Err(AttendanceError::DuplicateForDate(existing)) => Ok(Self {
                status: RecordStatus::Duplicate,
                message: duplicate_message(&existing),
                snapshot: Some(AttendanceRow::from(existing.as_ref())),
            }),
            Err(AttendanceError::UnknownStudent(_)) => Ok(Self {
                status: RecordStatus::Unknown,
                message: "Student not found".to_string(),
                snapshot: None,
            }),
            Err(AttendanceError::InvalidIdentifier(err)) => Ok(Self {
                status: RecordStatus::Invalid,
                message: err.to_string(),
                snapshot: None,
            }),
            Err(AttendanceError::Conflict { .. }) => Ok(Self {
                status: RecordStatus::Conflict,
                message: "Attendance could not be confirmed, please scan again".to_string(),
                snapshot: None,
            }),
            Err(other) => Err(other),
        }
    }
}

/// Report request; `None` asks for the recent listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAttendanceRequest {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Report response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAttendanceResponse {
    pub records: Vec<AttendanceRow>,
}

/// Handles one scan against `pool`.
pub fn record_attendance(
    pool: &ConnectionPool,
    request: &RecordAttendanceRequest,
    occurred_at: NaiveDateTime,
) -> Result<RecordAttendanceResponse, AttendanceError> {
    let conn = pool
        .get()
        .map_err(|err| AttendanceError::StoreUnavailable(RepoError::Db(err)))?;
    let recorder = AttendanceRecorder::new(
        SqliteStudentRepository::try_new(&conn)?,
        SqliteAttendanceRepository::try_new(&conn)?,
    );
    RecordAttendanceResponse::from_result(recorder.record(&request.idno, occurred_at))
}

/// Handles one report request against `pool`.
pub fn list_attendance(
    pool: &ConnectionPool,
    request: &ListAttendanceRequest,
    recent_limit: u32,
) -> RepoResult<ListAttendanceResponse> {
    let conn = pool.get()?;
    let query = AttendanceQuery::new(SqliteAttendanceRepository::try_new(&conn)?)
        .with_recent_limit(recent_limit);
    let records = query.list(request.date)?;
    Ok(ListAttendanceResponse {
        records: records.iter().map(AttendanceRow::from).collect(),
    })
}
