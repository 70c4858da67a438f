//! Database connection management
//!
//! This module provides the connection provider consumed by the entity stores.
//! Stores never open connections themselves; they borrow one from here.

use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::store::{Operation, Result, StoreError};

const CONN_TARGET: &str = "connection";

/// Core database connection wrapper
///
/// `DatabaseConn` owns one SQLite connection, configured from a
/// [`StoreConfig`]. The connection is released exactly once: either through
/// [`DatabaseConn::close`], which reports errors, or on drop.
#[derive(Debug)]
pub struct DatabaseConn {
    pub conn: Connection,
    path: Option<String>,
}

impl DatabaseConn {
    /// Open a database as described by `config`
    ///
    /// If `config.database_path` is `None`, an in-memory database is created.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let path = config.database_path.clone();
        let conn = match path.as_deref() {
            Some(p) => Connection::open(p).map_err(|e| StoreError::Open {
                path: p.to_string(),
                source: e,
            })?,
            None => Connection::open_in_memory().map_err(|e| StoreError::Open {
                path: ":memory:".to_string(),
                source: e,
            })?,
        };

        let db = DatabaseConn { conn, path };
        db.configure(config)?;
        info!(path = db.display_path(), "database opened");
        Ok(db)
    }

    /// Create an in-memory database with default settings
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Open a database file with default settings
    pub fn open_path(path: &str) -> Result<Self> {
        Self::open(&StoreConfig::with_path(path))
    }

    /// Apply the connection settings from the configuration
    fn configure(&self, config: &StoreConfig) -> Result<()> {
        let op = Operation::Configure;

        self.conn
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| StoreError::from_driver(op, CONN_TARGET, e))?;

        // In-memory databases always report "memory"
        if self.path.is_some() {
            let mode: String = self
                .conn
                .pragma_update_and_check(None, "journal_mode", &config.journal_mode, |row| {
                    row.get(0)
                })
                .map_err(|e| StoreError::from_driver(op, CONN_TARGET, e))?;
            debug!(journal_mode = %mode, "journal mode set");
        }

        self.conn
            .pragma_update(None, "foreign_keys", config.foreign_keys)
            .map_err(|e| StoreError::from_driver(op, CONN_TARGET, e))?;

        Ok(())
    }

    /// Path of the database file, or `:memory:`
    pub fn display_path(&self) -> &str {
        self.path.as_deref().unwrap_or(":memory:")
    }

    /// Check if a table exists in the database
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let count: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table_name],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::from_driver(Operation::Schema, CONN_TARGET, e))?;
        Ok(count > 0)
    }

    /// Release the connection, reporting any error from the engine
    pub fn close(self) -> Result<()> {
        let path = self.display_path().to_string();
        self.conn
            .close()
            .map_err(|(_, e)| StoreError::from_driver(Operation::Close, CONN_TARGET, e))?;
        info!(path = %path, "database closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = DatabaseConn::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_table_exists() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.conn
            .execute("CREATE TABLE test_table (id INTEGER PRIMARY KEY)", [])
            .unwrap();

        assert!(db.table_exists("test_table").unwrap());
        assert!(!db.table_exists("nonexistent_table").unwrap());
    }

    #[test]
    fn test_foreign_keys_setting() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let enabled: bool = db
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert!(enabled);

        let config = StoreConfig {
            foreign_keys: false,
            ..StoreConfig::in_memory()
        };
        let db = DatabaseConn::open(&config).unwrap();
        let enabled: bool = db
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert!(!enabled);
    }

    #[test]
    fn test_file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.sqlite3");
        let db = DatabaseConn::open_path(path.to_str().unwrap()).unwrap();

        let mode: String = db
            .conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        db.close().unwrap();
    }

    #[test]
    fn test_open_bad_path_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("store.sqlite3");

        let err = DatabaseConn::open_path(path.to_str().unwrap()).unwrap_err();
        assert_eq!(err.kind(), crate::store::ErrorKind::Connection);
        assert_eq!(err.operation(), Operation::Open);
    }
}
