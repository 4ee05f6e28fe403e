//! Student domain model.
//!
//! # Responsibility
//! - Define the identity record held by the student directory.
//! - Normalize and validate registration/edit input.
//!
//! # Invariants
//! - `idno` is trimmed, non-empty, free of whitespace and control chars.
//! - `idno` never changes after registration.
//! - Name, course and level fields are trimmed and non-empty.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Student identifier token (IDNO), as encoded in the scanned QR code.
pub type StudentId = String;

pub const MAX_IDNO_CHARS: usize = 64;
pub const MAX_FIELD_CHARS: usize = 128;

/// Validation failures for student identity fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentValidationError {
    /// Identifier is blank after trim.
    EmptyIdno,
    /// Identifier exceeds [`MAX_IDNO_CHARS`].
    IdnoTooLong { max_chars: usize },
    /// Identifier contains whitespace or a control character.
    IdnoInvalidChar(char),
    /// A descriptive field is blank after trim.
    EmptyField(&'static str),
    /// A descriptive field exceeds [`MAX_FIELD_CHARS`].
    FieldTooLong {
        field: &'static str,
        max_chars: usize,
    },
}

impl Display for StudentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyIdno => write!(f, "student idno must not be blank"),
            Self::IdnoTooLong { max_chars } => {
                write!(f, "student idno must be at most {max_chars} characters")
            }
            Self::IdnoInvalidChar(ch) => {
                write!(f, "student idno contains invalid character {ch:?}")
            }
            Self::EmptyField(field) => write!(f, "student {field} must not be blank"),
            Self::FieldTooLong { field, max_chars } => {
                write!(f, "student {field} must be at most {max_chars} characters")
            }
        }
    }
}

impl Error for StudentValidationError {}

/// Mutable descriptive attributes of a student.
///
/// Used both as part of [`Student`] and as the full-replacement payload for
/// directory edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub lastname: String,
    pub firstname: String,
    pub course: String,
    pub level: String,
}

impl StudentProfile {
    pub fn new(
        lastname: impl Into<String>,
        firstname: impl Into<String>,
        course: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        Self {
            lastname: lastname.into(),
            firstname: firstname.into(),
            course: course.into(),
            level: level.into(),
        }
    }

    /// Returns a trimmed copy, or the first failing field.
    pub fn normalized(&self) -> Result<Self, StudentValidationError> {
        Ok(Self {
            lastname: normalize_field("lastname", &self.lastname)?,
            firstname: normalize_field("firstname", &self.firstname)?,
            course: normalize_field("course", &self.course)?,
            level: normalize_field("level", &self.level)?,
        })
    }

    /// `"<first> <last>"`, the form used in scan feedback messages.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

/// Identity record owned by the student directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub idno: StudentId,
    #[serde(flatten)]
    pub profile: StudentProfile,
}

impl Student {
    pub fn new(idno: impl Into<StudentId>, profile: StudentProfile) -> Self {
        Self {
            idno: idno.into(),
            profile,
        }
    }

    /// Returns a trimmed copy after checking every field.
    pub fn normalized(&self) -> Result<Self, StudentValidationError> {
        Ok(Self {
            idno: normalize_idno(&self.idno)?,
            profile: self.profile.normalized()?,
        })
    }

    /// Validates without allocating a normalized copy.
    pub fn validate(&self) -> Result<(), StudentValidationError> {
        self.normalized().map(|_| ())
    }
}

/// Trims and validates a raw identifier token.
pub fn normalize_idno(raw: &str) -> Result<StudentId, StudentValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StudentValidationError::EmptyIdno);
    }
    if trimmed.chars().count() > MAX_IDNO_CHARS {
        return Err(StudentValidationError::IdnoTooLong {
            max_chars: MAX_IDNO_CHARS,
        });
    }
    if let Some(ch) = trimmed
        .chars()
        .find(|ch| ch.is_whitespace() || ch.is_control())
    {
        return Err(StudentValidationError::IdnoInvalidChar(ch));
    }
    Ok(trimmed.to_string())
}

fn normalize_field(field: &'static str, raw: &str) -> Result<String, StudentValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StudentValidationError::EmptyField(field));
    }
    if trimmed.chars().count() > MAX_FIELD_CHARS {
        return Err(StudentValidationError::FieldTooLong {
            field,
            max_chars: MAX_FIELD_CHARS,
        });
    }
    Ok(trimmed.to_string())
}
