//! Database module
//!
//! This module provides the connection side of rowstore:
//!
//! - **core**: SQLite connection provider and table bootstrap
//! - **handle**: `Database`, which owns a connection and hands out entity stores
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── connection  # DatabaseConn: open, configure, close
//! │   └── schema      # CREATE TABLE statements and status checks
//! │
//! └── handle          # Database: stores + transactions over one connection
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use rowstore::database::Database;
//! use rowstore::StoreConfig;
//!
//! let db = Database::open(&StoreConfig::with_path("/tmp/rowstore.sqlite3"))?;
//!
//! let id = db.comments().insert(&Comment::new("someone@example.com", None))?;
//!
//! db.run_in_transaction(|uow| {
//!     uow.users().insert(&user)?;
//!     uow.comments().insert(&comment)?;
//!     Ok(())
//! })?;
//! ```

pub mod core;
mod handle;

pub use core::{DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus};
pub use handle::{Database, TableCounts};

/// Ensure the directory holding the database file exists
pub fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory '{}': {}", data_dir, e))
}
