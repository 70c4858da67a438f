//! Error types for entity store operations
//!
//! Every failure that touches the connection is classified into one of four
//! caller-visible kinds (see [`ErrorKind`]). Errors always carry the failing
//! operation and the target table.

use std::fmt;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// The operation that was running when an error surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    Configure,
    Close,
    Schema,
    Insert,
    FindById,
    FindAll,
    Update,
    Delete,
    Count,
    Authenticate,
    Begin,
    Commit,
    Rollback,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Open => "open",
            Operation::Configure => "configure",
            Operation::Close => "close",
            Operation::Schema => "schema",
            Operation::Insert => "insert",
            Operation::FindById => "find_by_id",
            Operation::FindAll => "find_all",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Count => "count",
            Operation::Authenticate => "authenticate",
            Operation::Begin => "begin",
            Operation::Commit => "commit",
            Operation::Rollback => "rollback",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Coarse error classification exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport, I/O, locking or engine-level failure
    Connection,
    /// Uniqueness, foreign-key, NOT NULL or CHECK violation
    Constraint,
    /// Row shape does not match the record being mapped
    Scan,
    /// Point lookup, update or delete matched zero rows
    NotFound,
}

/// Errors surfaced by the entity store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database at '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{operation} on '{table}' failed: {source}")]
    Connection {
        operation: Operation,
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{operation} on '{table}' violated a constraint: {source}")]
    Constraint {
        operation: Operation,
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{operation} on '{table}' could not map row: {detail}")]
    Scan {
        operation: Operation,
        table: &'static str,
        detail: String,
    },

    #[error("no row in '{table}' with id {id}")]
    NotFound {
        operation: Operation,
        table: &'static str,
        id: String,
    },
}

impl StoreError {
    /// Classify a driver error raised by `operation` against `table`
    pub fn from_driver(operation: Operation, table: &'static str, err: rusqlite::Error) -> Self {
        if is_scan_error(&err) {
            return StoreError::Scan {
                operation,
                table,
                detail: err.to_string(),
            };
        }

        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => StoreError::Constraint {
                operation,
                table,
                source: err,
            },
            _ => StoreError::Connection {
                operation,
                table,
                source: err,
            },
        }
    }

    pub fn not_found(operation: Operation, table: &'static str, id: impl fmt::Display) -> Self {
        StoreError::NotFound {
            operation,
            table,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Open { .. } | StoreError::Connection { .. } => ErrorKind::Connection,
            StoreError::Constraint { .. } => ErrorKind::Constraint,
            StoreError::Scan { .. } => ErrorKind::Scan,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    /// True for the failures an insert reports as "write failed"
    pub fn is_write_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::Constraint | ErrorKind::Connection)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// The operation that failed
    pub fn operation(&self) -> Operation {
        match self {
            StoreError::Open { .. } => Operation::Open,
            StoreError::Connection { operation, .. }
            | StoreError::Constraint { operation, .. }
            | StoreError::Scan { operation, .. }
            | StoreError::NotFound { operation, .. } => *operation,
        }
    }

    /// The table the failing operation targeted
    pub fn table(&self) -> Option<&'static str> {
        match self {
            StoreError::Open { .. } => None,
            StoreError::Connection { table, .. }
            | StoreError::Constraint { table, .. }
            | StoreError::Scan { table, .. }
            | StoreError::NotFound { table, .. } => Some(table),
        }
    }
}

fn is_scan_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::InvalidColumnIndex(_)
        | rusqlite::Error::InvalidColumnName(_)
        | rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => true,
        rusqlite::Error::SqlInputError { msg, .. }
        | rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.starts_with("no such column"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (id TEXT PRIMARY KEY, n INTEGER NOT NULL)", [])
            .unwrap();
        conn
    }

    #[test]
    fn test_constraint_classification() {
        let conn = conn();
        conn.execute("INSERT INTO t (id, n) VALUES ('a', 1)", [])
            .unwrap();
        let err = conn
            .execute("INSERT INTO t (id, n) VALUES ('a', 2)", [])
            .unwrap_err();

        let err = StoreError::from_driver(Operation::Insert, "t", err);
        assert_eq!(err.kind(), ErrorKind::Constraint);
        assert!(err.is_write_failure());
        assert_eq!(err.table(), Some("t"));
    }

    #[test]
    fn test_scan_classification() {
        let conn = conn();
        conn.execute("INSERT INTO t (id, n) VALUES ('a', 1)", [])
            .unwrap();
        let err = conn
            .query_row("SELECT id FROM t", [], |row| row.get::<_, i64>(0))
            .unwrap_err();

        let err = StoreError::from_driver(Operation::FindAll, "t", err);
        assert_eq!(err.kind(), ErrorKind::Scan);
        assert!(!err.is_write_failure());
    }

    #[test]
    fn test_missing_column_is_scan() {
        let conn = conn();
        let err = conn.prepare("SELECT id, nn FROM t").unwrap_err();

        let err = StoreError::from_driver(Operation::FindAll, "t", err);
        assert_eq!(err.kind(), ErrorKind::Scan);
    }

    #[test]
    fn test_missing_table_is_connection() {
        let conn = conn();
        let err = conn.prepare("SELECT id FROM nope").unwrap_err();

        let err = StoreError::from_driver(Operation::FindAll, "nope", err);
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.operation(), Operation::FindAll);
    }

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found(Operation::FindById, "customer", "arya");
        assert!(err.is_not_found());
        assert_eq!(err.operation(), Operation::FindById);
        assert_eq!(err.to_string(), "no row in 'customer' with id arya");
    }
}
