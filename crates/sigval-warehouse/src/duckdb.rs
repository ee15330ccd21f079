//! `DuckDB` connection pool management.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use ::duckdb::Connection;
use tracing::debug;

/// Access mode for database connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Read-only access.
    ReadOnly,
    /// Read-write access.
    ReadWrite,
}

#[derive(Default)]
struct PoolState {
    read_only: Vec<Connection>,
    read_write: Vec<Connection>,
}

impl PoolState {
    fn idle(&mut self, mode: AccessMode) -> &mut Vec<Connection> {
        match mode {
            AccessMode::ReadOnly => &mut self.read_only,
            AccessMode::ReadWrite => &mut self.read_write,
        }
    }
}

struct PoolInner {
    db_path: PathBuf,
    max_pool_size: usize,
    /// Opened on first use; every pooled connection is a clone of it so all
    /// of them share one database instance.
    root: Mutex<Option<Connection>>,
    state: Mutex<PoolState>,
}

/// A connection pool manager for `DuckDB` connections.
#[derive(Clone)]
pub struct DuckDbConnectionManager {
    inner: Arc<PoolInner>,
}

impl DuckDbConnectionManager {
    /// Create a new connection pool manager.
    ///
    /// # Arguments
    /// * `path` - Path to the `DuckDB` database file
    /// * `max_pool_size` - Maximum number of idle connections kept per access mode
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_pool_size: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                db_path: path.into(),
                max_pool_size: max_pool_size.max(1),
                root: Mutex::new(None),
                state: Mutex::new(PoolState::default()),
            }),
        }
    }

    /// Acquire a connection from the pool, opening a new one when none is
    /// idle.
    ///
    /// # Errors
    /// Returns an error if the database file cannot be opened or configured.
    pub fn acquire(&self, mode: AccessMode) -> Result<PooledConnection, ::duckdb::Error> {
        let idle = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .idle(mode)
            .pop();

        let connection = match idle {
            Some(connection) => connection,
            None => self.open_connection(mode)?,
        };

        Ok(PooledConnection {
            mode,
            pool: Arc::clone(&self.inner),
            connection,
        })
    }

    fn open_connection(&self, mode: AccessMode) -> Result<Connection, ::duckdb::Error> {
        let mut root = self.inner.root.lock().unwrap_or_else(PoisonError::into_inner);
        let connection = match root.as_ref() {
            Some(root) => root.try_clone()?,
            None => {
                debug!(path = %self.inner.db_path.display(), "opening duckdb database");
                let opened = Connection::open(self.inner.db_path.as_path())?;
                let connection = opened.try_clone()?;
                *root = Some(opened);
                connection
            }
        };
        configure_connection(&connection, mode)?;
        Ok(connection)
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.inner.db_path.as_path()
    }

    /// Number of idle connections for `mode`.
    #[must_use]
    pub fn idle_count(&self, mode: AccessMode) -> usize {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .idle(mode)
            .len()
    }
}

/// A pooled connection that goes back to the pool when dropped.
pub struct PooledConnection {
    mode: AccessMode,
    pool: Arc<PoolInner>,
    connection: Connection,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let mut state = self.pool.state.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = state.idle(self.mode);
        if idle.len() >= self.pool.max_pool_size {
            return;
        }
        // A clone shares the underlying database instance.
        if let Ok(connection) = self.connection.try_clone() {
            idle.push(connection);
        }
    }
}

fn configure_connection(connection: &Connection, mode: AccessMode) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")?;
    // Access mode is fixed per database instance, so read-only connections
    // are a separate pool rather than a separate setting.
    debug!(?mode, "configured duckdb connection");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn connections_return_to_their_pool() {
        let temp = tempdir().expect("tempdir");
        let manager = DuckDbConnectionManager::new(temp.path().join("pool.duckdb"), 1);

        {
            let first = manager.acquire(AccessMode::ReadWrite).expect("acquire");
            let second = manager.acquire(AccessMode::ReadWrite).expect("acquire");
            first.execute_batch("CREATE TABLE t (x INTEGER)").expect("create");
            drop(second);
        }

        assert_eq!(manager.idle_count(AccessMode::ReadWrite), 1);
        assert_eq!(manager.idle_count(AccessMode::ReadOnly), 0);
    }
}
