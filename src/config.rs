use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Connection settings handed to [`crate::database::Database::open`]
///
/// This is a plain value: every store opened from it gets its own
/// connection, so tests and multiple stores in one process stay isolated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file; `None` opens an in-memory database
    pub database_path: Option<String>,

    /// How long a statement waits on a locked database before failing (default: 5 seconds)
    pub busy_timeout_ms: u64,

    /// SQLite journal mode for file databases (default: WAL)
    pub journal_mode: String,

    /// Enforce foreign-key constraints (default: true)
    pub foreign_keys: bool,
}

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;
const DEFAULT_JOURNAL_MODE: &str = "WAL";
const DATABASE_FILE_NAME: &str = "rowstore.sqlite3";

const EMPTY_CONFIG: &str = r#"### rowstore configuration file

### directory holding the database file
# data_dir = "~/.rowstore"

### explicit database file path (overrides data_dir)
# database_path = "/var/lib/rowstore/rowstore.sqlite3"

### connection settings
# busy_timeout_ms = 5000
# journal_mode = "WAL"
# foreign_keys = true
"#;

fn default_data_dir() -> String {
    let home_dir = dirs::home_dir()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());
    format!("{}/.rowstore", home_dir)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::with_path(&format!("{}/{}", default_data_dir(), DATABASE_FILE_NAME))
    }
}

impl StoreConfig {
    /// Settings for an in-memory database
    pub fn in_memory() -> Self {
        Self {
            database_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: DEFAULT_JOURNAL_MODE.to_string(),
            foreign_keys: true,
        }
    }

    /// Default settings for a database file at `path`
    pub fn with_path(path: &str) -> Self {
        Self {
            database_path: Some(path.to_string()),
            ..Self::in_memory()
        }
    }

    /// Load the configuration from a TOML file and `ROWSTORE_*` environment variables
    ///
    /// By default `$HOME/.rowstore/rowstore.toml` is used. A commented template
    /// is written when the file does not exist yet. Variables from a `.env`
    /// file in the working directory are loaded first.
    pub fn load(path: &Option<String>) -> Result<StoreConfig> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                let rowstore_dir = default_data_dir();
                std::fs::create_dir_all(rowstore_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create rowstore directory: {}", e))?;
                let p = Self::config_file_path();
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // E.g., `ROWSTORE_DATABASE_PATH=/tmp/test.sqlite3 rowstore status`
        builder = builder.add_source(config::Environment::with_prefix("ROWSTORE"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_map(&config)
    }

    fn from_map(config: &HashMap<String, String>) -> Result<StoreConfig> {
        let database_path = match (config.get("database_path"), config.get("data_dir")) {
            (Some(p), _) => p.clone(),
            (None, Some(dir)) => format!(
                "{}/{}",
                expand_home(dir).trim_end_matches('/'),
                DATABASE_FILE_NAME
            ),
            (None, None) => format!("{}/{}", default_data_dir(), DATABASE_FILE_NAME),
        };

        let busy_timeout_ms = match config.get("busy_timeout_ms") {
            Some(v) => v
                .parse()
                .map_err(|e| anyhow!("Invalid busy_timeout_ms '{}': {}", v, e))?,
            None => DEFAULT_BUSY_TIMEOUT_MS,
        };

        let journal_mode = config
            .get("journal_mode")
            .cloned()
            .unwrap_or_else(|| DEFAULT_JOURNAL_MODE.to_string());

        let foreign_keys = match config.get("foreign_keys") {
            Some(v) => v
                .parse()
                .map_err(|e| anyhow!("Invalid foreign_keys '{}': {}", v, e))?,
            None => true,
        };

        Ok(StoreConfig {
            database_path: Some(expand_home(&database_path)),
            busy_timeout_ms,
            journal_mode,
            foreign_keys,
        })
    }

    /// Directory that holds the database file, if it is file-backed
    pub fn data_dir(&self) -> Option<String> {
        let path = Path::new(self.database_path.as_deref()?);
        path.parent().map(|p| p.to_string_lossy().to_string())
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        [
            format!(
                "Database Path:      {}",
                self.database_path.as_deref().unwrap_or(":memory:")
            ),
            format!("Busy Timeout:       {} ms", self.busy_timeout_ms),
            format!("Journal Mode:       {}", self.journal_mode),
            format!("Foreign Keys:       {}", self.foreign_keys),
        ]
        .join("\n")
    }

    /// Get the default config file path
    pub fn config_file_path() -> String {
        format!("{}/rowstore.toml", default_data_dir())
    }
}

fn expand_home(path: &str) -> String {
    match path.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => format!("{}/{}", home.to_string_lossy(), rest),
            None => path.to_string(),
        },
        None => path.to_string(),
    }
}
