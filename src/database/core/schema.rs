//! Database schema bootstrap
//!
//! This module creates the tables the entity stores read and write. It only
//! creates what is missing; it never alters existing tables.

use rusqlite::Connection;
use tracing::info;

use crate::store::{Comment, Customer, Entity, Operation, Result, StoreError, User};

const SCHEMA_TARGET: &str = "schema";

/// Schema definitions for all tables
pub struct SchemaDefinitions;

impl SchemaDefinitions {
    pub const CUSTOMER_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS customer (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            balance INTEGER NOT NULL DEFAULT 0,
            rating REAL NOT NULL DEFAULT 0.0,
            created_at TEXT NOT NULL,
            birth_date TEXT,
            married INTEGER NOT NULL DEFAULT 0
        );
    "#;

    pub const USER_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS user (
            username TEXT PRIMARY KEY,
            password TEXT NOT NULL
        );
    "#;

    pub const COMMENTS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            comment TEXT
        );
    "#;

    pub const COMMENTS_INDEXES: &'static [&'static str] =
        &["CREATE INDEX IF NOT EXISTS idx_comments_email ON comments(email)"];

    /// Every table the stores expect, in creation order
    pub const TABLES: &'static [&'static str] = &[Customer::TABLE, User::TABLE, Comment::TABLE];
}

/// Schema manager
///
/// Handles table creation and status checks for a connection.
pub struct SchemaManager<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaManager<'a> {
    /// Create a new schema manager for the given connection
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create all tables and indexes that don't exist yet
    pub fn initialize(&self) -> Result<()> {
        self.run(SchemaDefinitions::CUSTOMER_TABLE)?;
        self.run(SchemaDefinitions::USER_TABLE)?;
        self.run(SchemaDefinitions::COMMENTS_TABLE)?;

        for index_sql in SchemaDefinitions::COMMENTS_INDEXES {
            self.run(index_sql)?;
        }

        info!("database schema initialized");
        Ok(())
    }

    /// Check which of the expected tables are present
    pub fn check_status(&self) -> Result<SchemaStatus> {
        let mut missing = Vec::new();
        for table in SchemaDefinitions::TABLES {
            if !self.table_exists(table)? {
                missing.push(table.to_string());
            }
        }

        if missing.is_empty() {
            Ok(SchemaStatus::Current)
        } else if missing.len() == SchemaDefinitions::TABLES.len() {
            Ok(SchemaStatus::NotInitialized)
        } else {
            Ok(SchemaStatus::Incomplete { missing })
        }
    }

    /// Reset the database by dropping all tables
    pub fn reset(&self) -> Result<()> {
        for table in SchemaDefinitions::TABLES.iter().rev() {
            // table names are compile-time constants
            self.run(&format!("DROP TABLE IF EXISTS {}", table))?;
        }
        info!("database schema reset");
        Ok(())
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let exists: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::from_driver(Operation::Schema, SCHEMA_TARGET, e))?;
        Ok(exists > 0)
    }

    fn run(&self, sql: &str) -> Result<()> {
        self.conn
            .execute(sql, [])
            .map_err(|e| StoreError::from_driver(Operation::Schema, SCHEMA_TARGET, e))?;
        Ok(())
    }
}

/// Status of the database schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// None of the tables exist (fresh database)
    NotInitialized,

    /// All tables exist
    Current,

    /// Some tables are missing
    Incomplete { missing: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_schema_not_initialized() {
        let conn = create_test_db();
        let manager = SchemaManager::new(&conn);

        assert_eq!(
            manager.check_status().unwrap(),
            SchemaStatus::NotInitialized
        );
    }

    #[test]
    fn test_schema_initialize() {
        let conn = create_test_db();
        let manager = SchemaManager::new(&conn);

        manager.initialize().unwrap();
        assert_eq!(manager.check_status().unwrap(), SchemaStatus::Current);

        // idempotent
        manager.initialize().unwrap();
        assert_eq!(manager.check_status().unwrap(), SchemaStatus::Current);
    }

    #[test]
    fn test_schema_incomplete() {
        let conn = create_test_db();
        let manager = SchemaManager::new(&conn);

        manager.initialize().unwrap();
        conn.execute("DROP TABLE comments", []).unwrap();

        assert_eq!(
            manager.check_status().unwrap(),
            SchemaStatus::Incomplete {
                missing: vec!["comments".to_string()]
            }
        );
    }

    #[test]
    fn test_schema_reset() {
        let conn = create_test_db();
        let manager = SchemaManager::new(&conn);

        manager.initialize().unwrap();
        manager.reset().unwrap();
        assert_eq!(
            manager.check_status().unwrap(),
            SchemaStatus::NotInitialized
        );
    }
}
