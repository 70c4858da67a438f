//! Entity store
//!
//! This module provides typed data access for single-entity tables:
//!
//! - **Entity**: a record type bound to one table, with its query text fixed at
//!   compile time and its row mapping
//! - **EntityStore**: insert, point lookup, full scan, update and delete for one
//!   entity over a borrowed connection
//! - **Records**: the lazy, one-shot row sequence produced by a full scan
//! - **UnitOfWork**: stores bound to one transaction
//!
//! Every caller-supplied value reaches the engine as a bound parameter. No
//! method on the store accepts query text.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rowstore::store::{EntityStore, Customer};
//!
//! let store = EntityStore::<Customer>::new(&conn);
//! let id = store.insert(&customer)?;
//! let found = store.find_by_id(&id)?;
//!
//! // Lazy scan; the cursor is released when the closure returns
//! let first_two = store.find_all(|records| records.take(2).collect())?;
//! ```

mod entities;
mod error;
mod transaction;

pub use entities::{Comment, Customer, User};
pub use error::{ErrorKind, Operation, Result, StoreError};
pub use transaction::{run_in_transaction, UnitOfWork};

use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;

use rusqlite::{Connection, Row, Rows, Statement, ToSql};
use tracing::debug;

/// A record type mapped 1:1 to the rows of one table
///
/// All query text is supplied as associated constants so the store never
/// builds SQL from runtime values. Placeholders in `INSERT_SQL` and
/// `UPDATE_SQL` must line up with [`Entity::insert_params`] and
/// [`Entity::update_params`]; `SELECT_BY_ID_SQL` and `DELETE_SQL` take the
/// identifier as `?1`.
pub trait Entity: Sized {
    /// Identifier type of the table's key column
    type Id: ToSql + fmt::Display + fmt::Debug + Clone;

    const TABLE: &'static str;

    /// Column names, in the order `from_row` reads them
    const COLUMNS: &'static [&'static str];

    const INSERT_SQL: &'static str;
    const SELECT_BY_ID_SQL: &'static str;
    const SELECT_ALL_SQL: &'static str;
    const UPDATE_SQL: &'static str;
    const DELETE_SQL: &'static str;
    const COUNT_SQL: &'static str;

    /// Materialize a record from a row shaped like `COLUMNS`
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn insert_params(&self) -> Vec<&dyn ToSql>;

    fn update_params(&self) -> Vec<&dyn ToSql>;

    /// The identifier of this record, if it has been assigned one
    fn id(&self) -> Option<Self::Id>;

    /// The identifier to report after a successful insert
    ///
    /// Tables with an engine-assigned key return `rowid`; tables keyed by a
    /// caller-supplied value return that value.
    fn inserted_id(&self, rowid: i64) -> Self::Id;
}

/// Typed data access for one entity over a borrowed connection
///
/// The connection may be a plain connection or an open transaction
/// (`rusqlite::Transaction` dereferences to `Connection`).
pub struct EntityStore<'c, E: Entity> {
    conn: &'c Connection,
    _entity: PhantomData<fn() -> E>,
}

impl<'c, E: Entity> EntityStore<'c, E> {
    /// Create a new store over an open connection
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    /// Insert one record, returning its identifier
    ///
    /// Fails with a constraint error when the key already exists.
    pub fn insert(&self, record: &E) -> Result<E::Id> {
        let mut stmt = self.prepare(Operation::Insert, E::INSERT_SQL)?;
        self.execute_insert(&mut stmt, record)
    }

    /// Insert a batch of records through one prepared statement
    ///
    /// The batch is not atomic by itself: records before a failing one stay
    /// inserted unless the call runs inside [`EntityStore::run_in_transaction`].
    pub fn insert_many(&self, records: &[E]) -> Result<Vec<E::Id>> {
        let mut stmt = self.prepare(Operation::Insert, E::INSERT_SQL)?;
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            ids.push(self.execute_insert(&mut stmt, record)?);
        }
        Ok(ids)
    }

    fn execute_insert(&self, stmt: &mut Statement<'_>, record: &E) -> Result<E::Id> {
        stmt.execute(record.insert_params().as_slice())
            .map_err(|e| StoreError::from_driver(Operation::Insert, E::TABLE, e))?;
        let id = record.inserted_id(self.conn.last_insert_rowid());
        debug!(table = E::TABLE, %id, "inserted row");
        Ok(id)
    }

    /// Look up one record by identifier
    ///
    /// Returns a `NotFound` error when no row matches. If several rows match,
    /// the first one in engine order is returned.
    pub fn find_by_id<Q>(&self, id: &Q) -> Result<E>
    where
        E::Id: Borrow<Q>,
        Q: ToSql + fmt::Display + ?Sized,
    {
        self.find_optional(id)?
            .ok_or_else(|| StoreError::not_found(Operation::FindById, E::TABLE, id))
    }

    /// Look up one record by identifier, returning `None` when absent
    pub fn find_optional<Q>(&self, id: &Q) -> Result<Option<E>>
    where
        E::Id: Borrow<Q>,
        Q: ToSql + fmt::Display + ?Sized,
    {
        let op = Operation::FindById;
        let mut stmt = self.prepare(op, E::SELECT_BY_ID_SQL)?;
        check_columns::<E>(&stmt, op)?;

        let mut rows = stmt
            .query([id])
            .map_err(|e| StoreError::from_driver(op, E::TABLE, e))?;

        let row = rows
            .next()
            .map_err(|e| StoreError::from_driver(op, E::TABLE, e))?;
        match row {
            Some(row) => E::from_row(row)
                .map(Some)
                .map_err(|e| StoreError::from_driver(op, E::TABLE, e)),
            None => Ok(None),
        }
    }

    /// Scan the whole table lazily
    ///
    /// `visit` receives a one-shot [`Records`] iterator; rows are read from
    /// the cursor only as the iterator advances, in the engine's default scan
    /// order. The cursor is released when `visit` returns, whether the
    /// sequence was exhausted, abandoned early, or failed.
    pub fn find_all<T, F>(&self, visit: F) -> Result<T>
    where
        F: FnOnce(&mut Records<'_, E>) -> Result<T>,
    {
        let op = Operation::FindAll;
        let mut stmt = self.prepare(op, E::SELECT_ALL_SQL)?;
        check_columns::<E>(&stmt, op)?;

        let rows = stmt
            .query([])
            .map_err(|e| StoreError::from_driver(op, E::TABLE, e))?;
        let mut records = Records::new(rows);
        visit(&mut records)
    }

    /// Read every record into memory
    pub fn list_all(&self) -> Result<Vec<E>> {
        self.find_all(|records| records.collect())
    }

    /// Overwrite the stored row that has the record's identifier
    pub fn update(&self, record: &E) -> Result<()> {
        let op = Operation::Update;
        let mut stmt = self.prepare(op, E::UPDATE_SQL)?;
        let changed = stmt
            .execute(record.update_params().as_slice())
            .map_err(|e| StoreError::from_driver(op, E::TABLE, e))?;

        if changed == 0 {
            let id = record
                .id()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "<unassigned>".to_string());
            return Err(StoreError::not_found(op, E::TABLE, id));
        }
        debug!(table = E::TABLE, "updated row");
        Ok(())
    }

    /// Delete the row with the given identifier
    pub fn delete<Q>(&self, id: &Q) -> Result<()>
    where
        E::Id: Borrow<Q>,
        Q: ToSql + fmt::Display + ?Sized,
    {
        let op = Operation::Delete;
        let mut stmt = self.prepare(op, E::DELETE_SQL)?;
        let changed = stmt
            .execute([id])
            .map_err(|e| StoreError::from_driver(op, E::TABLE, e))?;

        if changed == 0 {
            return Err(StoreError::not_found(op, E::TABLE, id));
        }
        debug!(table = E::TABLE, %id, "deleted row");
        Ok(())
    }

    /// Get the number of rows in the table
    pub fn count(&self) -> Result<u64> {
        let op = Operation::Count;
        let mut stmt = self.prepare(op, E::COUNT_SQL)?;
        stmt.query_row([], |row| row.get(0))
            .map_err(|e| StoreError::from_driver(op, E::TABLE, e))
    }

    /// Run `ops` against a store bound to a fresh transaction
    ///
    /// Commits when `ops` returns `Ok`, rolls back otherwise.
    pub fn run_in_transaction<T, F>(&self, ops: F) -> Result<T>
    where
        F: FnOnce(&EntityStore<'_, E>) -> Result<T>,
    {
        run_in_transaction(self.conn, |uow| ops(&uow.store::<E>()))
    }

    fn prepare(&self, op: Operation, sql: &'static str) -> Result<rusqlite::CachedStatement<'c>> {
        self.conn
            .prepare_cached(sql)
            .map_err(|e| StoreError::from_driver(op, E::TABLE, e))
    }
}

/// Reject statements whose result columns differ from the record's fields
fn check_columns<E: Entity>(stmt: &Statement<'_>, op: Operation) -> Result<()> {
    let actual = stmt.column_names();
    if actual.as_slice() != E::COLUMNS {
        return Err(StoreError::Scan {
            operation: op,
            table: E::TABLE,
            detail: format!(
                "query returns columns [{}] but record expects [{}]",
                actual.join(", "),
                E::COLUMNS.join(", ")
            ),
        });
    }
    Ok(())
}

/// Lazy, one-shot sequence of records read from an open cursor
///
/// Yields `Err` at most once; after an error or exhaustion the sequence is
/// fused and keeps returning `None`.
pub struct Records<'s, E: Entity> {
    rows: Rows<'s>,
    done: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<'s, E: Entity> Records<'s, E> {
    fn new(rows: Rows<'s>) -> Self {
        Self {
            rows,
            done: false,
            _entity: PhantomData,
        }
    }

    fn fail(&mut self, err: rusqlite::Error) -> Option<Result<E>> {
        self.done = true;
        Some(Err(StoreError::from_driver(
            Operation::FindAll,
            E::TABLE,
            err,
        )))
    }
}

impl<E: Entity> Iterator for Records<'_, E> {
    type Item = Result<E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.rows.next() {
            Ok(Some(row)) => match E::from_row(row) {
                Ok(record) => Some(Ok(record)),
                Err(e) => self.fail(e),
            },
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => self.fail(e),
        }
    }
}

impl<E: Entity> std::iter::FusedIterator for Records<'_, E> {}
