// crates/strongbox-config/src/physical.rs
// ============================================================================
// Module: Physical Options
// Description: Normalization of loose string options for the table backend.
// Purpose: Apply aliases and defaults, then build a typed table config.
// Dependencies: strongbox-core, strongbox-store-sqlite
// ============================================================================

//! ## Overview
//! Storage options arrive as a flat string map. Normalization happens in a
//! fixed order:
//!
//! 1. `max_parallel` is parsed (absent means the default permit count),
//! 2. legacy key spellings are renamed to their canonical form,
//! 3. defaults are injected for every unset key.
//!
//! The normalized map then yields either a verbatim `connection_url` or an
//! assembled `key=value;key=value` connection string, plus the
//! [`SqlTableConfig`] the backend is built from.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use strongbox_core::DEFAULT_PARALLEL_OPERATIONS;
use strongbox_store_sqlite::DEFAULT_APP_NAME;
use strongbox_store_sqlite::DEFAULT_BUSY_TIMEOUT_SECS;
use strongbox_store_sqlite::DEFAULT_DATABASE;
use strongbox_store_sqlite::DEFAULT_SCHEMA;
use strongbox_store_sqlite::DEFAULT_TABLE;
use strongbox_store_sqlite::DatabaseTarget;
use strongbox_store_sqlite::SqlTableConfig;

use crate::config::ConfigError;

// ============================================================================
// SECTION: Option Keys
// ============================================================================

/// Maximum concurrent operations.
pub const MAX_PARALLEL_KEY: &str = "max_parallel";
/// Verbatim connection URL; bypasses connection string assembly.
pub const CONNECTION_URL_KEY: &str = "connection_url";
/// Directory holding the database files.
pub const PATH_KEY: &str = "path";
/// Database name.
pub const DATABASE_KEY: &str = "database";
/// Schema name.
pub const SCHEMA_KEY: &str = "schema";
/// Table name.
pub const TABLE_KEY: &str = "table";
/// Application name.
pub const APP_NAME_KEY: &str = "appname";
/// Busy timeout in seconds.
pub const CONNECTION_TIMEOUT_KEY: &str = "connection timeout";
/// Statement log level; anything above zero enables statement tracing.
pub const LOG_LEVEL_KEY: &str = "log level";
/// Password; accepted and never displayed.
pub const PASSWORD_KEY: &str = "password";

/// Legacy spellings and their canonical keys.
const LEGACY_ALIASES: [(&str, &str); 3] = [
    ("connectiontimeout", CONNECTION_TIMEOUT_KEY),
    ("loglevel", LOG_LEVEL_KEY),
    ("username", "user id"),
];

/// Placeholder shown instead of a password.
const REDACTED: &str = "***";

/// Returns the default value for each defaulted key.
fn defaults() -> [(&'static str, String); 6] {
    [
        (DATABASE_KEY, DEFAULT_DATABASE.to_string()),
        (TABLE_KEY, DEFAULT_TABLE.to_string()),
        (APP_NAME_KEY, DEFAULT_APP_NAME.to_string()),
        (CONNECTION_TIMEOUT_KEY, DEFAULT_BUSY_TIMEOUT_SECS.to_string()),
        (SCHEMA_KEY, DEFAULT_SCHEMA.to_string()),
        (LOG_LEVEL_KEY, "0".to_string()),
    ]
}

// ============================================================================
// SECTION: Physical Options
// ============================================================================

/// Normalized storage options.
///
/// # Invariants
/// - No legacy key spelling remains once both spellings have been merged.
/// - Every defaulted key is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalOptions {
    /// Normalized key/value options.
    options: BTreeMap<String, String>,
    /// Parsed permit count.
    max_parallel: usize,
}

impl PhysicalOptions {
    /// Normalizes raw options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `max_parallel` is not an integer.
    pub fn normalize(raw: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let max_parallel = match raw.get(MAX_PARALLEL_KEY) {
            Some(value) => value.trim().parse::<usize>().map_err(|err| {
                ConfigError::Invalid(format!("failed parsing max_parallel parameter: {err}"))
            })?,
            None => DEFAULT_PARALLEL_OPERATIONS,
        };

        let mut options = raw.clone();
        for (legacy, canonical) in LEGACY_ALIASES {
            if let Some(value) = options.remove(legacy) {
                options.insert(canonical.to_string(), value);
            }
        }
        for (key, value) in defaults() {
            options.entry(key.to_string()).or_insert(value);
        }
        Ok(Self {
            options,
            max_parallel,
        })
    }

    /// Returns a normalized option value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Returns the parsed permit count.
    #[must_use]
    pub const fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Returns the non-empty `connection_url` override, if any.
    #[must_use]
    pub fn connection_url(&self) -> Option<&str> {
        self.get(CONNECTION_URL_KEY).filter(|url| !url.is_empty())
    }

    /// Returns the connection string: the URL override or `k=v;k=v` in key
    /// order.
    #[must_use]
    pub fn connection_string(&self) -> String {
        self.connection_url().map_or_else(|| self.assemble(false), str::to_string)
    }

    /// Returns the connection string with the password hidden.
    #[must_use]
    pub fn redacted_connection_string(&self) -> String {
        self.connection_url().map_or_else(|| self.assemble(true), str::to_string)
    }

    /// Joins every option as `key=value` separated by `;`.
    fn assemble(&self, redact: bool) -> String {
        self.options
            .iter()
            .map(|(key, value)| {
                if redact && key == PASSWORD_KEY {
                    format!("{key}={REDACTED}")
                } else {
                    format!("{key}={value}")
                }
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Builds the typed table backend configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when neither `connection_url` nor
    /// `path` is set, or a numeric option does not parse.
    pub fn table_config(&self) -> Result<SqlTableConfig, ConfigError> {
        let target = match self.connection_url() {
            Some(url) => DatabaseTarget::Url(url.to_string()),
            None => {
                let path = self
                    .get(PATH_KEY)
                    .map(str::trim)
                    .filter(|path| !path.is_empty())
                    .ok_or_else(|| {
                        ConfigError::Invalid(
                            "storage.options.path is required without connection_url".to_string(),
                        )
                    })?;
                DatabaseTarget::Directory(PathBuf::from(path))
            }
        };
        let timeout_secs = self.parse_number(CONNECTION_TIMEOUT_KEY)?;
        let log_level = self.parse_number(LOG_LEVEL_KEY)?;
        Ok(SqlTableConfig {
            target,
            database: self.required(DATABASE_KEY),
            schema: self.required(SCHEMA_KEY),
            table: self.required(TABLE_KEY),
            busy_timeout: Duration::from_secs(timeout_secs),
            max_parallel: self.max_parallel,
            log_statements: log_level > 0,
            app_name: self.required(APP_NAME_KEY),
        })
    }

    /// Returns a defaulted option.
    fn required(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// Parses a defaulted numeric option.
    fn parse_number(&self, key: &str) -> Result<u64, ConfigError> {
        let value = self.get(key).unwrap_or_default();
        value
            .trim()
            .parse::<u64>()
            .map_err(|err| ConfigError::Invalid(format!("failed parsing {key} parameter: {err}")))
    }
}
