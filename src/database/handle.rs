//! Database handle
//!
//! `Database` owns one configured connection, makes sure the tables exist, and
//! hands out entity stores and transactions over that connection.

use serde::Serialize;
use tracing::info;

use crate::config::StoreConfig;
use crate::database::core::{DatabaseConn, SchemaManager, SchemaStatus};
use crate::store::{
    run_in_transaction, Comment, Customer, Entity, EntityStore, Result, UnitOfWork, User,
};

/// Main database handle (SQLite backend)
///
/// Multiple handles may be open on the same file at once; each owns an
/// independent connection and the engine serializes their writes.
pub struct Database {
    db: DatabaseConn,
}

/// Row counts per table
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TableCounts {
    pub customers: u64,
    pub users: u64,
    pub comments: u64,
}

impl Database {
    /// Open the database described by `config`
    ///
    /// Missing tables are created. Existing tables are left untouched.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let db = DatabaseConn::open(config)?;
        let schema = SchemaManager::new(&db.conn);

        match schema.check_status()? {
            SchemaStatus::Current => {
                info!("database schema is current");
            }
            SchemaStatus::NotInitialized => {
                info!("initializing database schema");
                schema.initialize()?;
            }
            SchemaStatus::Incomplete { missing } => {
                info!("creating missing tables: {}", missing.join(", "));
                schema.initialize()?;
            }
        }

        Ok(Self { db })
    }

    /// Create an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Get a store for any entity
    pub fn store<E: Entity>(&self) -> EntityStore<'_, E> {
        EntityStore::new(&self.db.conn)
    }

    pub fn customers(&self) -> EntityStore<'_, Customer> {
        self.store()
    }

    pub fn users(&self) -> EntityStore<'_, User> {
        self.store()
    }

    pub fn comments(&self) -> EntityStore<'_, Comment> {
        self.store()
    }

    /// Run `ops` as one atomic unit of work
    ///
    /// See [`run_in_transaction`].
    pub fn run_in_transaction<T, F>(&self, ops: F) -> Result<T>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T>,
    {
        run_in_transaction(&self.db.conn, ops)
    }

    /// Get the schema status of the underlying connection
    pub fn schema_status(&self) -> Result<SchemaStatus> {
        SchemaManager::new(&self.db.conn).check_status()
    }

    /// Count rows in every table
    pub fn counts(&self) -> Result<TableCounts> {
        Ok(TableCounts {
            customers: self.customers().count()?,
            users: self.users().count()?,
            comments: self.comments().count()?,
        })
    }

    /// Path of the database file, or `:memory:`
    pub fn path(&self) -> &str {
        self.db.display_path()
    }

    /// Get the underlying database connection
    pub fn connection(&self) -> &rusqlite::Connection {
        &self.db.conn
    }

    /// Release the connection
    pub fn close(self) -> Result<()> {
        self.db.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ErrorKind;
    use chrono::Utc;

    fn customer(id: &str) -> Customer {
        Customer {
            id: id.to_string(),
            name: format!("Customer {}", id),
            email: None,
            balance: 0,
            rating: 0.0,
            created_at: Utc::now(),
            birth_date: None,
            married: false,
        }
    }

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.schema_status().unwrap(), SchemaStatus::Current);
        assert_eq!(db.counts().unwrap(), TableCounts::default());
        db.close().unwrap();
    }

    #[test]
    fn test_open_restores_missing_tables() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::with_path(dir.path().join("db.sqlite3").to_str().unwrap());

        let db = Database::open(&config).unwrap();
        db.customers().insert(&customer("keep")).unwrap();
        db.connection().execute("DROP TABLE comments", []).unwrap();
        db.close().unwrap();

        let db = Database::open(&config).unwrap();
        assert_eq!(db.schema_status().unwrap(), SchemaStatus::Current);
        assert_eq!(db.customers().count().unwrap(), 1);
    }

    #[test]
    fn test_transaction_atomic_all_or_nothing() {
        let db = Database::open_in_memory().unwrap();
        let n = 10;

        // failure at insert k leaves nothing behind
        let result = db.run_in_transaction(|uow| {
            let customers = uow.customers();
            for i in 0..n {
                let id = if i == 6 { "c0".to_string() } else { format!("c{}", i) };
                customers.insert(&customer(&id))?;
            }
            Ok(())
        });
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Constraint);
        assert!(db.customers().list_all().unwrap().is_empty());

        // success makes all of them visible
        db.run_in_transaction(|uow| {
            let customers = uow.customers();
            for i in 0..n {
                customers.insert(&customer(&format!("c{}", i)))?;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(db.customers().list_all().unwrap().len(), n);
    }

    #[test]
    fn test_independent_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.sqlite3");
        let config = StoreConfig {
            busy_timeout_ms: 0,
            ..StoreConfig::with_path(path.to_str().unwrap())
        };

        let writer = Database::open(&config).unwrap();
        let other = Database::open(&config).unwrap();

        writer.customers().insert(&customer("a")).unwrap();
        assert_eq!(other.customers().find_by_id("a").unwrap().id, "a");

        // a conflicting write is refused while the first connection holds the lock
        writer
            .run_in_transaction(|uow| {
                uow.customers().insert(&customer("b"))?;
                let err = other.customers().insert(&customer("c")).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::Connection);
                Ok(())
            })
            .unwrap();

        assert_eq!(other.customers().count().unwrap(), 2);
    }
}
