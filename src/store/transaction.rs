//! Closure-scoped transactions
//!
//! A unit of work runs a group of store operations against one transaction.
//! The transaction commits only when the closure returns `Ok`; an error from
//! any operation, or a panic unwinding through the closure, discards every
//! effect made inside it.

use rusqlite::{Connection, Transaction};
use tracing::{debug, warn};

use super::{Comment, Customer, Entity, EntityStore, Operation, Result, StoreError, User};

const TX_TARGET: &str = "transaction";

/// Stores bound to one open transaction
pub struct UnitOfWork<'t> {
    tx: &'t Transaction<'t>,
}

impl<'t> UnitOfWork<'t> {
    /// Get a store for any entity, bound to this transaction
    pub fn store<E: Entity>(&self) -> EntityStore<'_, E> {
        EntityStore::new(self.tx)
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
}

/// Run `ops` inside a new transaction on `conn`
///
/// Commits when `ops` returns `Ok` and returns its value. Rolls back and
/// returns the original error otherwise, even if the rollback itself fails. Fails with a connection error if a
/// transaction is already open on `conn`.
pub fn run_in_transaction<T, F>(conn: &Connection, ops: F) -> Result<T>
where
    F: FnOnce(&UnitOfWork<'_>) -> Result<T>,
{
    // `Transaction` rolls back on drop unless committed
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| StoreError::from_driver(Operation::Begin, TX_TARGET, e))?;
    debug!("transaction started");

    let outcome = ops(&UnitOfWork { tx: &tx });

    match outcome {
        Ok(value) => {
            tx.commit()
                .map_err(|e| StoreError::from_driver(Operation::Commit, TX_TARGET, e))?;
            debug!("transaction committed");
            Ok(value)
        }
        Err(err) => {
            warn!(error = %err, "rolling back transaction");
            // the engine may already have rolled back, e.g. after RAISE(ROLLBACK)
            if let Err(e) = tx.rollback() {
                let rollback_err = StoreError::from_driver(Operation::Rollback, TX_TARGET, e);
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::{DatabaseConn, SchemaManager};
    use crate::store::ErrorKind;
    use std::panic::{self, AssertUnwindSafe};

    fn setup_test_db() -> DatabaseConn {
        let db = DatabaseConn::open_in_memory().unwrap();
        SchemaManager::new(&db.conn).initialize().unwrap();
        db
    }

    fn comment(i: usize) -> Comment {
        Comment::new(format!("user{}@example.com", i), Some(format!("comment {}", i)))
    }

    #[test]
    fn test_commit_makes_all_visible() {
        let db = setup_test_db();

        let ids = run_in_transaction(&db.conn, |uow| {
            let comments = uow.comments();
            (0..10).map(|i| comments.insert(&comment(i))).collect::<Result<Vec<_>>>()
        })
        .unwrap();

        assert_eq!(ids.len(), 10);
        let all = EntityStore::<Comment>::new(&db.conn).list_all().unwrap();
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn test_failure_rolls_back_everything() {
        let db = setup_test_db();
        let n = 5;
        let k = 3;

        let result: Result<()> = run_in_transaction(&db.conn, |uow| {
            let users = uow.users();
            for i in 0..n {
                // inserting a duplicate key at step k induces a failure
                let name = if i == k { "user0".to_string() } else { format!("user{}", i) };
                users.insert(&User {
                    username: name,
                    password: "secret".to_string(),
                })?;
            }
            Ok(())
        });

        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Constraint);
        assert!(EntityStore::<User>::new(&db.conn)
            .list_all()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_caller_error_rolls_back() {
        let db = setup_test_db();

        let result: Result<()> = run_in_transaction(&db.conn, |uow| {
            uow.comments().insert(&comment(0))?;
            Err(StoreError::not_found(Operation::FindById, "comments", 42))
        });

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(EntityStore::<Comment>::new(&db.conn).count().unwrap(), 0);
    }

    #[test]
    fn test_spans_multiple_entities() {
        let db = setup_test_db();

        run_in_transaction(&db.conn, |uow| {
            uow.users().insert(&User {
                username: "fathir".to_string(),
                password: "fathir".to_string(),
            })?;
            uow.comments().insert(&comment(1))?;
            Ok(())
        })
        .unwrap();

        assert_eq!(EntityStore::<User>::new(&db.conn).count().unwrap(), 1);
        assert_eq!(EntityStore::<Comment>::new(&db.conn).count().unwrap(), 1);
    }

    #[test]
    fn test_nested_transaction_is_rejected() {
        let db = setup_test_db();

        let result: Result<()> = run_in_transaction(&db.conn, |uow| {
            uow.comments().insert(&comment(0))?;
            run_in_transaction(&db.conn, |_| Ok(()))
        });

        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.operation(), Operation::Begin);
        assert_eq!(EntityStore::<Comment>::new(&db.conn).count().unwrap(), 0);
    }

    #[test]
    fn test_store_level_transaction() {
        let db = setup_test_db();
        let store = EntityStore::<Comment>::new(&db.conn);

        let result = store.run_in_transaction(|tx_store| {
            tx_store.insert(&comment(0))?;
            tx_store.insert(&comment(1))?;
            tx_store.update(&Comment {
                id: Some(999),
                ..comment(2)
            })
        });

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_engine_rollback_keeps_original_error() {
        let db = setup_test_db();
        db.conn
            .execute_batch(
                "CREATE TRIGGER reject_bad_email BEFORE INSERT ON comments
                 WHEN NEW.email = 'bad'
                 BEGIN SELECT RAISE(ROLLBACK, 'bad email'); END;",
            )
            .unwrap();

        let result: Result<()> = run_in_transaction(&db.conn, |uow| {
            let comments = uow.comments();
            comments.insert(&Comment::new("ok", None))?;
            comments.insert(&Comment::new("bad", None))?;
            Ok(())
        });

        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Constraint);
        assert_eq!(err.operation(), Operation::Insert);
        assert!(db.conn.is_autocommit());
        assert_eq!(EntityStore::<Comment>::new(&db.conn).count().unwrap(), 0);
    }

    #[test]
    fn test_panic_rolls_back() {
        let db = setup_test_db();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let _: Result<()> = run_in_transaction(&db.conn, |uow| {
                uow.comments().insert(&comment(0))?;
                panic!("participant panicked");
            });
        }));

        assert!(outcome.is_err());
        assert!(db.conn.is_autocommit());
        assert_eq!(EntityStore::<Comment>::new(&db.conn).count().unwrap(), 0);

        // the connection is usable afterwards
        run_in_transaction(&db.conn, |uow| uow.comments().insert(&comment(1))).unwrap();
        assert_eq!(EntityStore::<Comment>::new(&db.conn).count().unwrap(), 1);
    }
}
