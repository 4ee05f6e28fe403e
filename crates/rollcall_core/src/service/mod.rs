//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into directory, recording and reporting
//!   use-cases.
//! - Keep CLI and other callers decoupled from storage details.

pub mod attendance_service;
pub mod context;
pub mod directory_service;
pub mod query_service;
