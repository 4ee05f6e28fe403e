//! Attendance repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist attendance facts and answer the per-day duplicate lookup.
//! - Serve ordered reporting scans by date.
//!
//! # Invariants
//! - `UNIQUE(idno, date)` is the authoritative one-per-day guard; a losing
//!   insert surfaces as `RepoError::Conflict`.
//! - No update or delete path exists for attendance rows.
//! - Read paths reject rows whose `date` disagrees with `time_in`.

use super::error::map_write_error;
use super::schema::ensure_table_ready;
use super::{ConflictTarget, RepoError, RepoResult};
use crate::model::attendance::{AttendanceRecord, NewAttendance, DATE_FORMAT, TIME_IN_FORMAT};
use crate::model::student::StudentProfile;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const ATTENDANCE_SELECT_SQL: &str = "SELECT
    id,
    idno,
    lastname,
    firstname,
    course,
    level,
    time_in,
    date
FROM attendance";

const ATTENDANCE_COLUMNS: &[&str] = &[
    "id",
    "idno",
    "lastname",
    "firstname",
    "course",
    "level",
    "time_in",
    "date",
];

/// Repository interface for attendance facts.
pub trait AttendanceRepository {
    /// Returns the record for `(idno, date)`, if any.
    fn find_for_date(&self, idno: &str, date: NaiveDate) -> RepoResult<Option<AttendanceRecord>>;
    /// Inserts one fact; `Conflict` when `(idno, date)` already exists.
    fn insert_attendance(&self, attendance: &NewAttendance) -> RepoResult<AttendanceRecord>;
    /// All records of `date`, `time_in` ascending.
    fn list_for_date(&self, date: NaiveDate) -> RepoResult<Vec<AttendanceRecord>>;
    /// Latest `limit` records, date then `time_in` descending.
    fn list_recent(&self, limit: u32) -> RepoResult<Vec<AttendanceRecord>>;
}

/// SQLite-backed attendance repository.
pub struct SqliteAttendanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttendanceRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "attendance", ATTENDANCE_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl AttendanceRepository for SqliteAttendanceRepository<'_> {
    fn find_for_date(&self, idno: &str, date: NaiveDate) -> RepoResult<Option<AttendanceRecord>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{ATTENDANCE_SELECT_SQL} WHERE idno = ?1 AND date = ?2;"
        ))?;
        let record = stmt
            .query_row(params![idno, format_date(date)], |row| {
                Ok(parse_attendance_row(row))
            })
            .optional()?;
        record.transpose()
    }

    fn insert_attendance(&self, attendance: &NewAttendance) -> RepoResult<AttendanceRecord> {
        let date = attendance.date();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO attendance (
                idno,
                lastname,
                firstname,
                course,
                level,
                time_in,
                date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                attendance.idno,
                attendance.snapshot.lastname,
                attendance.snapshot.firstname,
                attendance.snapshot.course,
                attendance.snapshot.level,
                attendance.time_in.format(TIME_IN_FORMAT).to_string(),
                format_date(date),
            ],
        )
        .map_err(|err| {
            map_write_error(
                err,
                ConflictTarget::Attendance {
                    idno: attendance.idno.clone(),
                    date,
                },
            )
        })?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(AttendanceRecord {
            id,
            idno: attendance.idno.clone(),
            snapshot: attendance.snapshot.clone(),
            time_in: attendance.time_in,
            date,
        })
    }

    fn list_for_date(&self, date: NaiveDate) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTENDANCE_SELECT_SQL}
             WHERE date = ?1
             ORDER BY time_in ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([format_date(date)])?;
        collect_rows(&mut rows)
    }

    fn list_recent(&self, limit: u32) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTENDANCE_SELECT_SQL}
             ORDER BY date DESC, time_in DESC, id DESC
             LIMIT ?1;"
        ))?;
        let mut rows = stmt.query([i64::from(limit)])?;
        collect_rows(&mut rows)
    }
}

fn collect_rows(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<AttendanceRecord>> {
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_attendance_row(row)?);
    }
    Ok(records)
}

fn parse_attendance_row(row: &Row<'_>) -> RepoResult<AttendanceRecord> {
    let id: i64 = row.get("id")?;

    let time_text: String = row.get("time_in")?;
    let time_in = NaiveDateTime::parse_from_str(&time_text, TIME_IN_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid time_in `{time_text}` in attendance row {id}"
        ))
    })?;

    let date_text: String = row.get("date")?;
    let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("invalid date `{date_text}` in attendance row {id}"))
    })?;

    if time_in.date() != date {
        return Err(RepoError::InvalidData(format!(
            "attendance row {id} has date {date} but time_in {time_in}"
        )));
    }

    Ok(AttendanceRecord {
        id,
        idno: row.get("idno")?,
        snapshot: StudentProfile {
            lastname: row.get("lastname")?,
            firstname: row.get("firstname")?,
            course: row.get("course")?,
            level: row.get("level")?,
        },
        time_in,
        date,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
