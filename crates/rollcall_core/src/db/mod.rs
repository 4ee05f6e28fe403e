//! SQLite access for the attendance store.
//!
//! # Responsibility
//! - Open connections that are configured and fully migrated.
//! - Share a bounded set of connections between concurrent scanners.
//!
//! # Invariants
//! - No connection leaves this module before its schema is current.
//! - Uniqueness of students and of daily attendance lives in the schema.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod pool;

pub use open::{open_db, open_db_in_memory};
pub use pool::{ConnectionPool, PoolOptions, PooledConnection};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was migrated by a newer binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A thread panicked while holding the pool lock.
    PoolPoisoned,
    /// No connection became available within the checkout timeout.
    PoolTimeout {
        waited_ms: u128,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "schema version {db_version} is ahead of this build (max {latest_supported})"
            ),
            Self::PoolPoisoned => write!(f, "connection pool lock poisoned"),
            Self::PoolTimeout { waited_ms } => {
                write!(f, "no database connection available after {waited_ms}ms")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. }
            | Self::PoolPoisoned
            | Self::PoolTimeout { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}
