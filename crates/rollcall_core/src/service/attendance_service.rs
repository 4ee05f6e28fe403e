//! Attendance recording use-case service.
//!
//! # Responsibility
//! - Turn `(idno, occurred_at)` scan events into attendance facts.
//! - Enforce one record per student per calendar date.
//!
//! # Invariants
//! - The pre-insert duplicate read is an early exit only; the store's
//!   `UNIQUE(idno, date)` constraint decides races.
//! - A lost insert race is reported as `DuplicateForDate` carrying the
//!   winning record, never as a second row.
//! - Unknown identifiers never create a record.

use crate::model::attendance::{calendar_date, AttendanceRecord, NewAttendance};
use crate::model::student::{StudentId, StudentValidationError};
use crate::repo::attendance_repo::AttendanceRepository;
use crate::repo::student_repo::StudentRepository;
use crate::repo::{ConflictTarget, RepoError};
use crate::service::directory_service::{DirectoryError, StudentDirectory};
use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{debug, error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejections and failures of [`AttendanceRecorder::record`].
#[derive(Debug)]
pub enum AttendanceError {
    /// Scanned identifier is blank.
    InvalidIdentifier(StudentValidationError),
    /// Identifier is not in the student directory.
    UnknownStudent(StudentId),
    /// A record already exists for the date; carries that record.
    DuplicateForDate(Box<AttendanceRecord>),
    /// Insert collided but the winning record could not be read back.
    Conflict { idno: StudentId, date: NaiveDate },
    /// Persistence failure.
    StoreUnavailable(RepoError),
}

impl Display for AttendanceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(err) => write!(f, "{err}"),
            Self::UnknownStudent(idno) => write!(f, "student not found: {idno}"),
            Self::DuplicateForDate(existing) => write!(f, "{}", duplicate_message(existing)),
            Self::Conflict { idno, date } => {
                write!(f, "attendance for {idno} on {date} conflicted with a concurrent scan")
            }
            Self::StoreUnavailable(err) => write!(f, "attendance store unavailable: {err}"),
        }
    }
}

impl Error for AttendanceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidIdentifier(err) => Some(err),
            Self::StoreUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AttendanceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Conflict(ConflictTarget::Attendance { idno, date }) => {
                Self::Conflict { idno, date }
            }
            other => Self::StoreUnavailable(other),
        }
    }
}

impl From<DirectoryError> for AttendanceError {
    fn from(value: DirectoryError) -> Self {
        match value {
            DirectoryError::InvalidStudent(err) => Self::InvalidIdentifier(err),
            DirectoryError::NotFound(idno) => Self::UnknownStudent(idno),
            DirectoryError::StoreUnavailable(err) => Self::StoreUnavailable(err),
            // Lookups never produce these; keep them as store failures.
            other @ (DirectoryError::MissingContext | DirectoryError::Conflict(_)) => {
                Self::StoreUnavailable(RepoError::InvalidData(other.to_string()))
            }
        }
    }
}

/// Scan feedback for a repeated scan, e.g.
/// `Jane Doe has already logged attendance today at 08:00:00`.
pub fn duplicate_message(existing: &AttendanceRecord) -> String {
    format!(
        "{} has already logged attendance today at {}",
        existing.snapshot.display_name(),
        existing.time_of_day()
    )
}

/// Attendance recorder over a student directory and attendance store.
pub struct AttendanceRecorder<S: StudentRepository, A: AttendanceRepository> {
    directory: StudentDirectory<S>,
    attendance: A,
}

impl<S: StudentRepository, A: AttendanceRepository> AttendanceRecorder<S, A> {
    pub fn new(students: S, attendance: A) -> Self {
        Self {
            directory: StudentDirectory::new(students),
            attendance,
        }
    }

    /// Records a scan at `occurred_at` (local wall-clock time).
    ///
    /// # Contract
    /// - `Ok` carries the inserted snapshot.
    /// - `Err(DuplicateForDate)` carries the record that already owns the date.
    /// - `Err(UnknownStudent)` when the identifier is not registered.
    pub fn record(
        &self,
        idno: &str,
        occurred_at: NaiveDateTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let result = self.record_inner(idno, occurred_at);
        log_record_outcome(&result);
        result
    }

    /// Records a scan stamped with the system local clock.
    pub fn record_now(&self, idno: &str) -> Result<AttendanceRecord, AttendanceError> {
        self.record(idno, Local::now().naive_local())
    }

    fn record_inner(
        &self,
        idno: &str,
        occurred_at: NaiveDateTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let student = match self.directory.find(idno) {
            Ok(Some(student)) => student,
            // Only a blank scan is malformed; any other value no registered
            // identifier can match is simply unknown.
            Ok(None)
            | Err(DirectoryError::InvalidStudent(
                StudentValidationError::IdnoTooLong { .. }
                | StudentValidationError::IdnoInvalidChar(_),
            )) => return Err(AttendanceError::UnknownStudent(idno.trim().to_string())),
            Err(err) => return Err(err.into()),
        };

        let date = calendar_date(occurred_at);
        if let Some(existing) = self.attendance.find_for_date(&student.idno, date)? {
            return Err(AttendanceError::DuplicateForDate(Box::new(existing)));
        }

        let new = NewAttendance::for_student(&student, occurred_at);
        match self.attendance.insert_attendance(&new) {
            Ok(record) => Ok(record),
            Err(RepoError::Conflict(ConflictTarget::Attendance { idno, date })) => {
                // A concurrent scan committed between our read and insert.
                match self.attendance.find_for_date(&idno, date)? {
                    Some(winner) => Err(AttendanceError::DuplicateForDate(Box::new(winner))),
                    None => Err(AttendanceError::Conflict { idno, date }),
                }
            }
            Err(other) => Err(other.into()),
        }
    }
}

fn log_record_outcome(result: &Result<AttendanceRecord, AttendanceError>) {
    match result {
        Ok(record) => debug!(
            "event=attendance_record module=attendance status=ok outcome=recorded record_id={}",
            record.id
        ),
        Err(AttendanceError::DuplicateForDate(existing)) => debug!(
            "event=attendance_record module=attendance status=ok outcome=duplicate record_id={}",
            existing.id
        ),
        Err(AttendanceError::UnknownStudent(_)) => {
            debug!("event=attendance_record module=attendance status=ok outcome=unknown")
        }
        Err(AttendanceError::InvalidIdentifier(_)) => {
            debug!("event=attendance_record module=attendance status=ok outcome=invalid")
        }
        Err(AttendanceError::Conflict { .. }) => warn!(
            "event=attendance_record module=attendance status=error error_code=unresolved_conflict"
        ),
        Err(AttendanceError::StoreUnavailable(err)) => error!(
            "event=attendance_record module=attendance status=error error_code=store_unavailable error={err}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{AttendanceError, AttendanceRecorder};
    use crate::api::{RecordAttendanceResponse, RecordStatus};
    use crate::db::open_db_in_memory;
    use crate::model::attendance::{AttendanceRecord, NewAttendance};
    use crate::model::student::{Student, StudentProfile};
    use crate::repo::attendance_repo::{AttendanceRepository, SqliteAttendanceRepository};
    use crate::repo::student_repo::{SqliteStudentRepository, StudentRepository};
    use crate::repo::RepoResult;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::cell::Cell;

    /// Hides existing rows from the first `find_for_date` call, simulating a
    /// concurrent scan that commits after the duplicate pre-check.
    struct StalePrecheck<'conn> {
        inner: SqliteAttendanceRepository<'conn>,
        hide_next_lookup: Cell<bool>,
    }

    impl AttendanceRepository for StalePrecheck<'_> {
        fn find_for_date(
            &self,
            idno: &str,
            date: NaiveDate,
        ) -> RepoResult<Option<AttendanceRecord>> {
            if self.hide_next_lookup.replace(false) {
                return Ok(None);
            }
            self.inner.find_for_date(idno, date)
        }

        fn insert_attendance(&self, attendance: &NewAttendance) -> RepoResult<AttendanceRecord> {
            self.inner.insert_attendance(attendance)
        }

        fn list_for_date(&self, date: NaiveDate) -> RepoResult<Vec<AttendanceRecord>> {
            self.inner.list_for_date(date)
        }

        fn list_recent(&self, limit: u32) -> RepoResult<Vec<AttendanceRecord>> {
            self.inner.list_recent(limit)
        }
    }

    /// Never sees existing rows, so the insert collides and the re-read
    /// after the collision comes back empty as well.
    struct BlindLookup<'conn> {
        inner: SqliteAttendanceRepository<'conn>,
    }

    impl AttendanceRepository for BlindLookup<'_> {
        fn find_for_date(
            &self,
            _idno: &str,
            _date: NaiveDate,
        ) -> RepoResult<Option<AttendanceRecord>> {
            Ok(None)
        }

        fn insert_attendance(&self, attendance: &NewAttendance) -> RepoResult<AttendanceRecord> {
            self.inner.insert_attendance(attendance)
        }

        fn list_for_date(&self, date: NaiveDate) -> RepoResult<Vec<AttendanceRecord>> {
            self.inner.list_for_date(date)
        }

        fn list_recent(&self, limit: u32) -> RepoResult<Vec<AttendanceRecord>> {
            self.inner.list_recent(limit)
        }
    }

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn lost_insert_race_reports_winning_record_as_duplicate() {
        let conn = open_db_in_memory().unwrap();
        let students = SqliteStudentRepository::try_new(&conn).unwrap();
        students
            .create_student(&Student::new(
                "2021-001",
                StudentProfile::new("Doe", "Jane", "BSCS", "3rd Year"),
            ))
            .unwrap();

        let attendance = SqliteAttendanceRepository::try_new(&conn).unwrap();
        let winner = attendance
            .insert_attendance(&NewAttendance::for_student(
                &students.get_student("2021-001").unwrap().unwrap(),
                at("2024-01-10T08:00:00"),
            ))
            .unwrap();

        let recorder = AttendanceRecorder::new(
            SqliteStudentRepository::try_new(&conn).unwrap(),
            StalePrecheck {
                inner: SqliteAttendanceRepository::try_new(&conn).unwrap(),
                hide_next_lookup: Cell::new(true),
            },
        );

        let err = recorder
            .record("2021-001", at("2024-01-10T08:00:01"))
            .unwrap_err();
        match err {
            AttendanceError::DuplicateForDate(existing) => assert_eq!(existing.id, winner.id),
            other => panic!("unexpected error: {other}"),
        }

        let rows = attendance
            .list_for_date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn duplicate_message_names_student_and_original_time() {
        let conn = open_db_in_memory().unwrap();
        let students = SqliteStudentRepository::try_new(&conn).unwrap();
        students
            .create_student(&Student::new(
                "2021-001",
                StudentProfile::new("Doe", "Jane", "BSCS", "3rd Year"),
            ))
            .unwrap();
        let recorder = AttendanceRecorder::new(
            students,
            SqliteAttendanceRepository::try_new(&conn).unwrap(),
        );

        recorder.record("2021-001", at("2024-01-10T08:00:00")).unwrap();
        let err = recorder
            .record("2021-001", at("2024-01-10T08:05:00"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Jane Doe has already logged attendance today at 08:00:00"
        );
    }

    #[test]
    fn unreadable_collision_winner_is_conflict() {
        let conn = open_db_in_memory().unwrap();
        let students = SqliteStudentRepository::try_new(&conn).unwrap();
        students
            .create_student(&Student::new(
                "2021-001",
                StudentProfile::new("Doe", "Jane", "BSCS", "3rd Year"),
            ))
            .unwrap();
        let recorder = AttendanceRecorder::new(
            students,
            BlindLookup {
                inner: SqliteAttendanceRepository::try_new(&conn).unwrap(),
            },
        );

        recorder.record("2021-001", at("2024-01-10T08:00:00")).unwrap();
        let err = recorder
            .record("2021-001", at("2024-01-10T08:00:01"))
            .unwrap_err();
        assert!(matches!(
            &err,
            AttendanceError::Conflict { idno, .. } if idno == "2021-001"
        ));

        let response = RecordAttendanceResponse::from_result(Err(err)).unwrap();
        assert_eq!(response.status, RecordStatus::Conflict);
        assert!(response.snapshot.is_none());
    }
}
