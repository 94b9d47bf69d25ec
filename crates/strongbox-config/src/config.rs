// crates/strongbox-config/src/config.rs
// ============================================================================
// Module: Strongbox Configuration
// Description: Configuration loading and validation for Strongbox.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: strongbox-core, strongbox-store-sqlite, serde, time, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown fields, unsupported backends, and unparsable storage options all
//! fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use strongbox_core::LeaseExtender;
use strongbox_store_sqlite::SqlIdentifier;
use strongbox_store_sqlite::SqlTableConfig;
use strongbox_store_sqlite::SqlTableError;
use thiserror::Error;

use crate::physical::PhysicalOptions;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "strongbox.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "STRONGBOX_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default maximum lease offset in seconds (32 days).
pub const DEFAULT_MAX_LEASE_OFFSET_SECS: u64 = 32 * 24 * 60 * 60;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrongboxConfig {
    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Lease capping settings.
    #[serde(default)]
    pub lease: LeaseConfig,
}

/// Supported storage backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Single-table `SQLite` backend.
    #[default]
    Sqlite,
}

/// Storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Backend selector.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Loose physical options, normalized by [`PhysicalOptions`].
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// Lease capping settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaseConfig {
    /// Furthest a renewed lease may expire from now, in seconds.
    #[serde(default = "default_max_offset_secs")]
    pub max_offset_secs: u64,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            max_offset_secs: DEFAULT_MAX_LEASE_OFFSET_SECS,
        }
    }
}

/// Serde default for [`LeaseConfig::max_offset_secs`].
const fn default_max_offset_secs() -> u64 {
    DEFAULT_MAX_LEASE_OFFSET_SECS
}

impl StrongboxConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order is `path`, then `STRONGBOX_CONFIG`, then
    /// `strongbox.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Parses and validates configuration bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bytes are oversized, not UTF-8, not
    /// valid TOML, or fail validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let table = self.table_config()?;
        let invalid = |err: SqlTableError| ConfigError::Invalid(err.to_string());
        SqlIdentifier::parse("database", &table.database).map_err(invalid)?;
        SqlIdentifier::parse_schema(&table.schema).map_err(invalid)?;
        SqlIdentifier::parse("table", &table.table).map_err(invalid)?;
        self.lease.validate()?;
        Ok(())
    }

    /// Returns the normalized storage options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an option does not parse.
    pub fn physical_options(&self) -> Result<PhysicalOptions, ConfigError> {
        PhysicalOptions::normalize(&self.storage.options)
    }

    /// Returns the typed configuration for the selected backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when storage options are incomplete
    /// or malformed.
    pub fn table_config(&self) -> Result<SqlTableConfig, ConfigError> {
        match self.storage.backend {
            StorageBackend::Sqlite => self.physical_options()?.table_config(),
        }
    }

    /// Builds the lease extender for the configured maximum offset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the offset is out of range.
    pub fn lease_extender(&self) -> Result<LeaseExtender, ConfigError> {
        Ok(LeaseExtender::new(self.lease.max_offset()?))
    }
}

impl LeaseConfig {
    /// Returns the maximum offset as a duration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the offset is zero or too large.
    pub fn max_offset(&self) -> Result<time::Duration, ConfigError> {
        if self.max_offset_secs == 0 {
            return Err(ConfigError::Invalid(
                "lease.max_offset_secs must be greater than zero".to_string(),
            ));
        }
        let secs = i64::try_from(self.max_offset_secs).map_err(|_| {
            ConfigError::Invalid("lease.max_offset_secs exceeds supported range".to_string())
        })?;
        Ok(time::Duration::seconds(secs))
    }

    /// Validates lease settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when settings are out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.max_offset().map(|_| ())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}
