#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Rowstore - typed data access for single-entity SQLite tables
//!
//! Rowstore maps fixed-shape records to and from SQLite tables. Every query
//! is fixed at compile time and every caller-supplied value is passed as a
//! bound parameter.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Entity stores, connection provider, configuration | `rusqlite`, `config` |
//! | `display` | Table formatting with `tabled` | `tabled` |
//! | `cli` | `rowstore` command-line tool | All above + `clap`, `tracing-subscriber` |
//!
//! # Architecture
//!
//! - **[`store`]**: the entity stores
//!   - `EntityStore`: insert, find_by_id, find_all, update, delete, count
//!   - `Records`: lazy one-shot row sequence released with its scan
//!   - `run_in_transaction` / `UnitOfWork`: atomic groups of operations
//!   - `Customer`, `User`, `Comment`: the record types
//!   - `StoreError`: connection, constraint, scan and not-found errors
//!
//! - **[`database`]**: connection provider and schema bootstrap
//!
//! - **[`config`]**: explicit connection settings
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use rowstore::{Comment, Database, StoreConfig};
//!
//! let db = Database::open(&StoreConfig::in_memory())?;
//!
//! // Engine-assigned identifier
//! let id = db.comments().insert(&Comment::new("someone@example.com", None))?;
//! let stored = db.comments().find_by_id(&id)?;
//!
//! // Lazy scan, stopping after the first row
//! let first = db.comments().find_all(|records| records.next().transpose())?;
//!
//! // All or nothing
//! db.run_in_transaction(|uow| {
//!     for i in 0..10 {
//!         uow.comments().insert(&Comment::new(format!("user{i}@example.com"), None))?;
//!     }
//!     Ok(())
//! })?;
//! ```

pub mod config;
pub mod database;
pub mod output;
pub mod store;

// =============================================================================
// Configuration
// =============================================================================

pub use config::StoreConfig;

// =============================================================================
// Database
// =============================================================================

pub use database::{
    Database, DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus, TableCounts,
};

// =============================================================================
// Entity stores
// =============================================================================

pub use store::{
    run_in_transaction, Comment, Customer, Entity, EntityStore, ErrorKind, Operation, Records,
    StoreError, UnitOfWork, User,
};

pub use output::OutputFormat;
