//! Student directory use-case service.
//!
//! # Responsibility
//! - Resolve identifiers to students for the attendance recorder.
//! - Gate administrative register/update/remove on an explicit caller.
//!
//! # Invariants
//! - Identifiers are normalized before any lookup or write.
//! - Removing a student leaves attendance history untouched.
//! - Administrative calls without an operator never reach the repository.

use crate::model::student::{
    normalize_idno, Student, StudentId, StudentProfile, StudentValidationError,
};
use crate::repo::student_repo::StudentRepository;
use crate::repo::{ConflictTarget, RepoError};
use crate::service::context::AdminContext;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from student directory operations.
#[derive(Debug)]
pub enum DirectoryError {
    /// Candidate or identifier failed field validation.
    InvalidStudent(StudentValidationError),
    /// Administrative call carried no operator.
    MissingContext,
    /// Identifier is already registered.
    Conflict(StudentId),
    /// Target student does not exist.
    NotFound(StudentId),
    /// Persistence failure.
    StoreUnavailable(RepoError),
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidStudent(err) => write!(f, "{err}"),
            Self::MissingContext => write!(f, "administrative operation requires an operator"),
            Self::Conflict(idno) => write!(f, "student with idno {idno} already exists"),
            Self::NotFound(idno) => write!(f, "student not found: {idno}"),
            Self::StoreUnavailable(err) => write!(f, "student store unavailable: {err}"),
        }
    }
}

impl Error for DirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidStudent(err) => Some(err),
            Self::StoreUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StudentValidationError> for DirectoryError {
    fn from(value: StudentValidationError) -> Self {
        Self::InvalidStudent(value)
    }
}

impl From<RepoError> for DirectoryError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidStudent(err),
            RepoError::NotFound(idno) => Self::NotFound(idno),
            RepoError::Conflict(ConflictTarget::Student(idno)) => Self::Conflict(idno),
            other => Self::StoreUnavailable(other),
        }
    }
}

/// Student directory facade.
pub struct StudentDirectory<R: StudentRepository> {
    repo: R,
}

impl<R: StudentRepository> StudentDirectory<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Exact-match retrieval; `NotFound` when absent.
    pub fn lookup(&self, idno: &str) -> Result<Student, DirectoryError> {
        let idno = normalize_idno(idno)?;
        match self.repo.get_student(&idno)? {
            Some(student) => Ok(student),
            None => Err(DirectoryError::NotFound(idno)),
        }
    }

    /// Retrieval that reports absence as `None`.
    pub fn find(&self, idno: &str) -> Result<Option<Student>, DirectoryError> {
        let idno = normalize_idno(idno)?;
        self.repo.get_student(&idno).map_err(Into::into)
    }

    /// Lists every registered student.
    pub fn list(&self) -> Result<Vec<Student>, DirectoryError> {
        self.repo.list_students().map_err(Into::into)
    }

    /// Registers a new student.
    ///
    /// # Errors
    /// - `Conflict` when the identifier is already registered, including when
    ///   a concurrent registration wins the race.
    pub fn register(
        &self,
        ctx: &AdminContext,
        candidate: &Student,
    ) -> Result<Student, DirectoryError> {
        ensure_context(ctx, "student_register")?;
        let result = self.repo.create_student(candidate).map_err(DirectoryError::from);
        log_admin_outcome("student_register", ctx, &result);
        result
    }

    /// Replaces name, course and level of an existing student.
    pub fn update(
        &self,
        ctx: &AdminContext,
        idno: &str,
        profile: &StudentProfile,
    ) -> Result<Student, DirectoryError> {
        ensure_context(ctx, "student_update")?;
        let result = self
            .repo
            .update_student(idno, profile)
            .map_err(DirectoryError::from);
        log_admin_outcome("student_update", ctx, &result);
        result
    }

    /// Deletes a student; attendance records keep their snapshots.
    pub fn remove(&self, ctx: &AdminContext, idno: &str) -> Result<(), DirectoryError> {
        ensure_context(ctx, "student_remove")?;
        let result = self.repo.delete_student(idno).map_err(DirectoryError::from);
        log_admin_outcome("student_remove", ctx, &result);
        result
    }
}

fn ensure_context(ctx: &AdminContext, event: &str) -> Result<(), DirectoryError> {
    if ctx.is_present() {
        return Ok(());
    }
    warn!("event={event} module=directory status=error error_code=missing_context");
    Err(DirectoryError::MissingContext)
}

fn log_admin_outcome<T>(event: &str, ctx: &AdminContext, result: &Result<T, DirectoryError>) {
    match result {
        Ok(_) => info!(
            "event={event} module=directory status=ok operator={}",
            ctx.operator()
        ),
        Err(err) => warn!(
            "event={event} module=directory status=error operator={} error_code={}",
            ctx.operator(),
            error_code(err)
        ),
    }
}

fn error_code(err: &DirectoryError) -> &'static str {
    match err {
        DirectoryError::InvalidStudent(_) => "invalid_student",
        DirectoryError::MissingContext => "missing_context",
        DirectoryError::Conflict(_) => "conflict",
        DirectoryError::NotFound(_) => "not_found",
        DirectoryError::StoreUnavailable(_) => "store_unavailable",
    }
}
