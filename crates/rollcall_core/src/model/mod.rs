//! Domain model for students and attendance facts.
//!
//! # Responsibility
//! - Define canonical records used by directory and attendance logic.
//! - Own field validation and calendar-date derivation.
//!
//! # Invariants
//! - A student is identified by a stable, unique `StudentId`.
//! - Attendance records copy student fields at recording time and never
//!   follow later directory edits.

pub mod attendance;
pub mod student;
