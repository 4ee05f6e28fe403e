//! Bounded SQLite connection pool.
//!
//! # Responsibility
//! - Share one database between concurrent request handlers.
//! - Reuse bootstrapped connections instead of reopening per call.
//!
//! # Invariants
//! - At most `max_size` connections exist at any time.
//! - Every pooled connection has been through `open_db` bootstrap.
//! - In-memory pools hold exactly one connection; each in-memory connection
//!   would otherwise be a separate database.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use log::{debug, warn};
use rusqlite::Connection;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

const DEFAULT_POOL_SIZE: usize = 4;
const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

/// Sizing and wait policy for [`ConnectionPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Upper bound on open connections. Values below 1 are treated as 1.
    pub max_size: usize,
    /// How long `get` waits for a free connection.
    pub checkout_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_POOL_SIZE,
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
enum PoolSource {
    File(PathBuf),
    Memory,
}

struct PoolState {
    idle: Vec<Connection>,
    open: usize,
}

/// Connection pool handing out [`PooledConnection`] guards.
///
/// The pool is `Sync`; share it by reference (or `Arc`) between threads.
pub struct ConnectionPool {
    source: PoolSource,
    options: PoolOptions,
    state: Mutex<PoolState>,
    available: Condvar,
}

impl ConnectionPool {
    /// Opens a pool over a database file.
    ///
    /// One connection is opened eagerly so schema and path errors surface
    /// here instead of on the first request.
    pub fn open(path: impl AsRef<Path>, options: PoolOptions) -> DbResult<Self> {
        let source = PoolSource::File(path.as_ref().to_path_buf());
        Self::with_source(source, options)
    }

    /// Opens a single-connection pool over a private in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        let options = PoolOptions {
            max_size: 1,
            ..PoolOptions::default()
        };
        Self::with_source(PoolSource::Memory, options)
    }

    fn with_source(source: PoolSource, mut options: PoolOptions) -> DbResult<Self> {
        options.max_size = options.max_size.max(1);
        let first = connect(&source)?;
        Ok(Self {
            source,
            options,
            state: Mutex::new(PoolState {
                idle: vec![first],
                open: 1,
            }),
            available: Condvar::new(),
        })
    }

    /// Checks out one connection, waiting up to the configured timeout.
    pub fn get(&self) -> DbResult<PooledConnection<'_>> {
        let started_at = Instant::now();
        let mut state = self.lock()?;

        loop {
            if let Some(conn) = state.idle.pop() {
                return Ok(PooledConnection::new(self, conn));
            }

            if state.open < self.options.max_size {
                state.open += 1;
                drop(state);
                return match connect(&self.source) {
                    Ok(conn) => {
                        debug!("event=pool_grow module=db status=ok");
                        Ok(PooledConnection::new(self, conn))
                    }
                    Err(err) => {
                        self.release_slot();
                        Err(err)
                    }
                };
            }

            let waited = started_at.elapsed();
            let Some(remaining) = self.options.checkout_timeout.checked_sub(waited) else {
                warn!(
                    "event=pool_checkout module=db status=error error_code=pool_timeout waited_ms={}",
                    waited.as_millis()
                );
                return Err(DbError::PoolTimeout {
                    waited_ms: waited.as_millis(),
                });
            };
            let (next, _) = self
                .available
                .wait_timeout(state, remaining)
                .map_err(|_| DbError::PoolPoisoned)?;
            state = next;
        }
    }

    /// Number of connections currently open (idle plus checked out).
    pub fn open_connections(&self) -> usize {
        self.lock().map_or(0, |state| state.open)
    }

    /// Effective upper bound on open connections.
    pub fn max_size(&self) -> usize {
        self.options.max_size
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, PoolState>> {
        self.state.lock().map_err(|_| DbError::PoolPoisoned)
    }

    fn give_back(&self, conn: Connection) {
        match self.state.lock() {
            Ok(mut state) => {
                state.idle.push(conn);
                self.available.notify_one();
            }
            // Poisoned: the connection is dropped, the slot stays accounted
            // for and every later `get` reports `PoolPoisoned`.
            Err(_) => drop(conn),
        }
    }

    fn release_slot(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.open = state.open.saturating_sub(1);
            self.available.notify_one();
        }
    }
}

fn connect(source: &PoolSource) -> DbResult<Connection> {
    match source {
        PoolSource::File(path) => open_db(path),
        PoolSource::Memory => open_db_in_memory(),
    }
}

/// Checked-out connection; returns to its pool on drop.
pub struct PooledConnection<'pool> {
    pool: &'pool ConnectionPool,
    conn: Option<Connection>,
}

impl<'pool> PooledConnection<'pool> {
    fn new(pool: &'pool ConnectionPool, conn: Connection) -> Self {
        Self {
            pool,
            conn: Some(conn),
        }
    }
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `Drop` takes the connection out.
        self.conn
            .as_ref()
            .unwrap_or_else(|| unreachable!("pooled connection used after release"))
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.give_back(conn);
        }
    }
}
