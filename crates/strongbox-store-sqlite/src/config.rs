// crates/strongbox-store-sqlite/src/config.rs
// ============================================================================
// Module: SQLite Table Configuration
// Description: Typed configuration for the SQLite table backend.
// Purpose: Name the database, schema, and table and bound connection usage.
// Dependencies: strongbox-core
// ============================================================================

//! ## Overview
//! [`SqlTableConfig`] is the fully-resolved input to
//! [`SqliteTableBackend::new`](crate::SqliteTableBackend::new). Producing it
//! from loose string options (defaults, legacy aliases, connection URLs) is
//! the job of the configuration layer, not of the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use strongbox_core::DEFAULT_PARALLEL_OPERATIONS;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default database name.
pub const DEFAULT_DATABASE: &str = "Vault";
/// Default table name.
pub const DEFAULT_TABLE: &str = "Vault";
/// Default schema name; `main` is the database file itself.
pub const DEFAULT_SCHEMA: &str = "main";
/// Default application name used to label diagnostics.
pub const DEFAULT_APP_NAME: &str = "Vault";
/// Default busy timeout in seconds.
pub const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 30;
/// Upper bound on pooled connections regardless of `max_parallel`.
pub const MAX_POOL_CONNECTIONS: usize = 32;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Location of the main database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// Directory holding `<database>.db` and any attached schema files.
    Directory(PathBuf),
    /// SQLite URI used verbatim; the database name is not consulted.
    Url(String),
}

/// Configuration for the SQLite table backend.
///
/// # Invariants
/// - `database`, `schema`, and `table` are validated as identifiers at
///   construction time, before any SQL runs.
/// - `max_parallel` of zero means [`DEFAULT_PARALLEL_OPERATIONS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlTableConfig {
    /// Where the main database lives.
    pub target: DatabaseTarget,
    /// Database name.
    pub database: String,
    /// Schema name; anything other than `main` is an attached database.
    pub schema: String,
    /// Table name.
    pub table: String,
    /// How long a connection waits on a locked database.
    pub busy_timeout: Duration,
    /// Maximum concurrent store operations.
    pub max_parallel: usize,
    /// Emit a debug event for every executed statement.
    pub log_statements: bool,
    /// Application label attached to diagnostics.
    pub app_name: String,
}

impl SqlTableConfig {
    /// Creates a configuration with default names rooted at `path`.
    #[must_use]
    pub fn in_directory(path: impl Into<PathBuf>) -> Self {
        Self {
            target: DatabaseTarget::Directory(path.into()),
            database: DEFAULT_DATABASE.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            table: DEFAULT_TABLE.to_string(),
            busy_timeout: Duration::from_secs(DEFAULT_BUSY_TIMEOUT_SECS),
            max_parallel: DEFAULT_PARALLEL_OPERATIONS,
            log_statements: false,
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }

    /// Returns the effective permit count.
    #[must_use]
    pub const fn effective_max_parallel(&self) -> usize {
        if self.max_parallel == 0 { DEFAULT_PARALLEL_OPERATIONS } else { self.max_parallel }
    }

    /// Returns how many connections the backend keeps open for a
    /// file-backed database. An in-memory database always gets one.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.effective_max_parallel().min(MAX_POOL_CONNECTIONS)
    }
}
