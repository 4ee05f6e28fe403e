//! Core domain logic for Rollcall school attendance.
//! This crate is the single source of truth for directory and attendance
//! invariants.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use api::{
    list_attendance, record_attendance, AttendanceRow, ListAttendanceRequest,
    ListAttendanceResponse, RecordAttendanceRequest, RecordAttendanceResponse, RecordStatus,
};
pub use config::{ConfigError, RollcallConfig};
pub use db::{ConnectionPool, DbError, PoolOptions};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::attendance::{calendar_date, AttendanceRecord, NewAttendance};
pub use model::student::{Student, StudentId, StudentProfile, StudentValidationError};
pub use repo::attendance_repo::{AttendanceRepository, SqliteAttendanceRepository};
pub use repo::student_repo::{SqliteStudentRepository, StudentRepository};
pub use repo::{ConflictTarget, RepoError, RepoResult};
pub use service::attendance_service::{AttendanceError, AttendanceRecorder};
pub use service::context::AdminContext;
pub use service::directory_service::{DirectoryError, StudentDirectory};
pub use service::query_service::AttendanceQuery;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
