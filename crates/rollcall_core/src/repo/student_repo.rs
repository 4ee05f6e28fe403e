//! Student repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide lookup and CRUD over the `students` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths normalize and validate input before SQL mutations.
//! - `create_student` checks and inserts inside one immediate transaction;
//!   the `UNIQUE(idno)` constraint is the final arbiter.
//! - `delete_student` never touches `attendance`.

use super::error::map_write_error;
use super::schema::ensure_table_ready;
use super::{ConflictTarget, RepoError, RepoResult};
use crate::model::student::{normalize_idno, Student, StudentProfile};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const STUDENT_SELECT_SQL: &str = "SELECT
    idno,
    lastname,
    firstname,
    course,
    level
FROM students";

const STUDENT_COLUMNS: &[&str] = &["idno", "lastname", "firstname", "course", "level"];

/// Repository interface for the student directory.
pub trait StudentRepository {
    /// Exact-match lookup by identifier.
    fn get_student(&self, idno: &str) -> RepoResult<Option<Student>>;
    /// All students ordered by last name, first name, identifier.
    fn list_students(&self) -> RepoResult<Vec<Student>>;
    /// Inserts a new student; `Conflict` when the identifier exists.
    fn create_student(&self, student: &Student) -> RepoResult<Student>;
    /// Replaces the mutable profile of an existing student.
    fn update_student(&self, idno: &str, profile: &StudentProfile) -> RepoResult<Student>;
    /// Deletes one student row.
    fn delete_student(&self, idno: &str) -> RepoResult<()>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "students", STUDENT_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn get_student(&self, idno: &str) -> RepoResult<Option<Student>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{STUDENT_SELECT_SQL} WHERE idno = ?1;"))?;
        let student = stmt
            .query_row([idno], |row| Ok(parse_student_row(row)))
            .optional()?;
        student.transpose()
    }

    fn list_students(&self) -> RepoResult<Vec<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STUDENT_SELECT_SQL} ORDER BY lastname ASC, firstname ASC, idno ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            students.push(parse_student_row(row)?);
        }
        Ok(students)
    }

    fn create_student(&self, student: &Student) -> RepoResult<Student> {
        let student = student.normalized()?;
        let conflict = || ConflictTarget::Student(student.idno.clone());

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if student_exists_in_tx(&tx, &student.idno)? {
            return Err(RepoError::Conflict(conflict()));
        }

        tx.execute(
            "INSERT INTO students (
                idno,
                lastname,
                firstname,
                course,
                level
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                student.idno,
                student.profile.lastname,
                student.profile.firstname,
                student.profile.course,
                student.profile.level,
            ],
        )
        .map_err(|err| map_write_error(err, conflict()))?;
        tx.commit()?;

        Ok(student)
    }

    fn update_student(&self, idno: &str, profile: &StudentProfile) -> RepoResult<Student> {
        let idno = normalize_idno(idno)?;
        let profile = profile.normalized()?;

        let changed = self.conn.execute(
            "UPDATE students
             SET
                lastname = ?2,
                firstname = ?3,
                course = ?4,
                level = ?5
             WHERE idno = ?1;",
            params![
                idno,
                profile.lastname,
                profile.firstname,
                profile.course,
                profile.level,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(idno));
        }

        Ok(Student::new(idno, profile))
    }

    fn delete_student(&self, idno: &str) -> RepoResult<()> {
        let idno = normalize_idno(idno)?;
        let changed = self
            .conn
            .execute("DELETE FROM students WHERE idno = ?1;", [idno.as_str()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(idno));
        }

        Ok(())
    }
}

fn student_exists_in_tx(tx: &Transaction<'_>, idno: &str) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM students WHERE idno = ?1);",
        [idno],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let student = Student::new(
        row.get::<_, String>("idno")?,
        StudentProfile {
            lastname: row.get("lastname")?,
            firstname: row.get("firstname")?,
            course: row.get("course")?,
            level: row.get("level")?,
        },
    );
    student
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("students row `{}`: {err}", student.idno)))?;
    Ok(student)
}
