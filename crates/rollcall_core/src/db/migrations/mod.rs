//! Schema steps for the attendance store.
//!
//! # Responsibility
//! - Own the ordered list of schema steps shipped with this binary.
//! - Bring a connection up to the newest step inside one transaction.
//!
//! # Invariants
//! - Step versions start at 1 and grow by one.
//! - `PRAGMA user_version` always equals the last committed step.
//! - Concurrent openers serialize on an immediate transaction, so a schema
//!   step never runs twice against the same database file.

use crate::db::{DbError, DbResult};
use rusqlite::{Connection, TransactionBehavior};

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "attendance_daily_unique",
        sql: include_str!("0002_attendance_daily_unique.sql"),
    },
];

/// Newest schema version this binary can write.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Upgrades `conn` to [`latest_version`]; no-op when already current.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer binary.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let latest = latest_version();
    if stored_version(conn, latest)? == latest {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    // Re-read under the write lock; a concurrent opener may have finished.
    let stored = stored_version(&tx, latest)?;
    for step in SCHEMA_STEPS.iter().filter(|step| step.version > stored) {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        log::debug!(
            "event=schema_step module=db status=ok version={} name={}",
            step.version,
            step.name
        );
    }
    tx.commit()?;
    Ok(())
}

fn stored_version(conn: &Connection, latest: u32) -> DbResult<u32> {
    let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: version,
            latest_supported: latest,
        });
    }
    Ok(version)
}
