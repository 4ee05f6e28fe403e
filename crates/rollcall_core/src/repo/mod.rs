//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate input before persistence.
//! - Store uniqueness violations surface as `RepoError::Conflict`, never as
//!   a raw SQLite error.
//! - Repository constructors reject connections without the current schema.

pub mod attendance_repo;
mod error;
mod schema;
pub mod student_repo;

pub use error::{ConflictTarget, RepoError, RepoResult};
