// crates/strongbox-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Table Backend
// Description: Physical key/value backend stored in one SQLite table.
// Purpose: Serve put/get/delete/list through prepared statements.
// Dependencies: strongbox-core, rusqlite, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! [`SqliteTableBackend`] owns a small pool of `SQLite` connections, each
//! bootstrapped against the configured schema and holding the compiled
//! statement set. Every operation first takes a permit from the backend's
//! [`PermitPool`], then runs its statement on a blocking worker thread. The
//! permit travels with the worker, so it is released when the statement
//! finishes even if the calling future is dropped.
//!
//! Security posture: key bytes are bound as parameters; configured names are
//! allow-listed identifiers and are the only interpolated SQL.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Instant;

use async_trait::async_trait;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use strongbox_core::BackendError;
use strongbox_core::BackendMetrics;
use strongbox_core::BackendOp;
use strongbox_core::Entry;
use strongbox_core::NoopMetrics;
use strongbox_core::PermitPool;
use strongbox_core::PhysicalBackend;
use strongbox_core::collapse_listing;
use strongbox_core::validate_key;
use thiserror::Error;

use crate::bootstrap;
use crate::bootstrap::TableNames;
use crate::config::SqlTableConfig;
use crate::statements::StatementName;
use crate::statements::Statements;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Backend label reported to metrics sinks.
const BACKEND_NAME: &str = "sqlite";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Bootstrap step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStep {
    /// Opening or creating the main database.
    CreateDatabase,
    /// Applying connection pragmas.
    Configure,
    /// Probing for an attached schema.
    CheckSchema,
    /// Attaching the schema database.
    CreateSchema,
    /// Creating the key/value table.
    CreateTable,
}

impl BootstrapStep {
    /// Returns the step description used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateDatabase => "create sqlite database",
            Self::Configure => "configure sqlite connection",
            Self::CheckSchema => "check if sqlite schema exists",
            Self::CreateSchema => "create sqlite schema",
            Self::CreateTable => "create sqlite table",
        }
    }

    /// Builds the bootstrap error for this step.
    pub(crate) fn fail(self, message: impl fmt::Display) -> SqlTableError {
        SqlTableError::Bootstrap {
            step: self,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for BootstrapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQLite table backend errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqlTableError {
    /// A configured name is not an allowed identifier.
    #[error("invalid {kind} name: {value:?}")]
    InvalidIdentifier {
        /// Which name was rejected.
        kind: &'static str,
        /// Rejected value.
        value: String,
    },
    /// A bootstrap step failed.
    #[error("failed to {step}: {message}")]
    Bootstrap {
        /// Failing step.
        step: BootstrapStep,
        /// Underlying error message.
        message: String,
    },
    /// A registered statement failed to compile.
    #[error("failed to prepare {name} statement: {message}")]
    Prepare {
        /// Statement label.
        name: &'static str,
        /// Underlying error message.
        message: String,
    },
    /// `SQLite` engine error during an operation.
    #[error("sqlite table db error: {0}")]
    Db(String),
    /// Connection pool failure.
    #[error("sqlite table io error: {0}")]
    Io(String),
    /// Invalid stored data.
    #[error("sqlite table invalid data: {0}")]
    Invalid(String),
}

impl From<rusqlite::Error> for SqlTableError {
    fn from(error: rusqlite::Error) -> Self {
        match error {
            rusqlite::Error::InvalidColumnType(_, column, kind) => {
                Self::Invalid(format!("column {column} holds {kind}"))
            }
            other => Self::Db(other.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Connection Pool
// ============================================================================

/// Shared connection state.
struct TableInner {
    /// Bootstrapped connections.
    connections: Vec<Mutex<Connection>>,
    /// Round-robin cursor.
    cursor: AtomicUsize,
    /// Statement registry.
    statements: Statements,
    /// Emit a debug event per executed statement.
    log_statements: bool,
    /// Application label for diagnostics.
    app_name: String,
}

impl TableInner {
    /// Returns an idle connection, or waits on the next one in rotation.
    fn connection(&self) -> Result<MutexGuard<'_, Connection>, SqlTableError> {
        let len = self.connections.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % len;
        for offset in 0 .. len {
            if let Ok(guard) = self.connections[(start + offset) % len].try_lock() {
                return Ok(guard);
            }
        }
        self.connections[start]
            .lock()
            .map_err(|_| SqlTableError::Io("sqlite connection mutex poisoned".to_string()))
    }

    /// Traces a statement execution when statement logging is enabled.
    fn trace(&self, name: StatementName, key: &str) {
        if self.log_statements {
            tracing::debug!(
                app = %self.app_name,
                statement = name.as_str(),
                sql = self.statements.sql(name),
                key,
                "executing statement"
            );
        }
    }

    /// Upserts one entry.
    fn put(&self, entry: &Entry) -> Result<(), SqlTableError> {
        self.trace(StatementName::Put, &entry.key);
        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(self.statements.sql(StatementName::Put))?;
        statement.execute(params![entry.key, entry.value])?;
        Ok(())
    }

    /// Reads one entry.
    fn get(&self, key: &str) -> Result<Option<Entry>, SqlTableError> {
        self.trace(StatementName::Get, key);
        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(self.statements.sql(StatementName::Get))?;
        let value: Option<Vec<u8>> =
            statement.query_row(params![key], |row| row.get(0)).optional()?;
        Ok(value.map(|value| Entry::new(key, value)))
    }

    /// Deletes one entry.
    fn delete(&self, key: &str) -> Result<(), SqlTableError> {
        self.trace(StatementName::Delete, key);
        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(self.statements.sql(StatementName::Delete))?;
        statement.execute(params![key])?;
        Ok(())
    }

    /// Lists the immediate children of `prefix`.
    fn list(&self, prefix: &str) -> Result<Vec<String>, SqlTableError> {
        self.trace(StatementName::List, prefix);
        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(self.statements.sql(StatementName::List))?;
        let keys = statement
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(collapse_listing(prefix, keys))
    }
}

// ============================================================================
// SECTION: Backend
// ============================================================================

/// Physical backend storing entries in one `SQLite` table.
///
/// # Invariants
/// - Every pooled connection has the schema attached and every statement
///   compiled before the backend is returned.
/// - At most `max_parallel` operations run against the store at once.
#[derive(Clone)]
pub struct SqliteTableBackend {
    /// Connection pool and statements.
    inner: Arc<TableInner>,
    /// Concurrency gate.
    permits: PermitPool,
    /// Latency sink.
    metrics: Arc<dyn BackendMetrics>,
}

impl SqliteTableBackend {
    /// Bootstraps the configured table and opens the connection pool.
    ///
    /// This performs blocking I/O; async callers should run it on a blocking
    /// thread.
    ///
    /// # Errors
    ///
    /// Returns [`SqlTableError`] when a name is invalid, a bootstrap step
    /// fails, or a statement does not compile.
    pub fn new(config: SqlTableConfig) -> Result<Self, SqlTableError> {
        let names = TableNames::from_config(&config)?;
        let span = tracing::info_span!(
            "bootstrap",
            app = %config.app_name,
            database = %names.database,
            schema = %names.schema,
            table = %names.table
        );
        let _entered = span.enter();

        let statements = Statements::new(&names.qualified_table());
        let first = bootstrap::open_database(&config, &names)?;
        bootstrap::ensure_schema(&first, &names)?;
        bootstrap::ensure_table(&first, &names)?;
        statements.prepare_on(&first)?;
        let pool_size = if bootstrap::is_file_backed(&first)? {
            config.pool_size()
        } else {
            tracing::debug!("database has no backing file; using a single connection");
            1
        };

        let mut connections = Vec::with_capacity(pool_size);
        connections.push(Mutex::new(first));
        while connections.len() < pool_size {
            let connection = bootstrap::open_database(&config, &names)?;
            bootstrap::ensure_schema(&connection, &names)?;
            statements.prepare_on(&connection)?;
            connections.push(Mutex::new(connection));
        }
        tracing::info!(connections = pool_size, "sqlite table ready");

        Ok(Self {
            inner: Arc::new(TableInner {
                connections,
                cursor: AtomicUsize::new(0),
                statements,
                log_statements: config.log_statements,
                app_name: config.app_name.clone(),
            }),
            permits: PermitPool::new(config.effective_max_parallel()),
            metrics: Arc::new(NoopMetrics),
        })
    }

    /// Replaces the metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn BackendMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns the concurrency gate.
    #[must_use]
    pub const fn permits(&self) -> &PermitPool {
        &self.permits
    }

    /// Returns the number of pooled connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Runs `work` on a blocking thread while holding a permit.
    ///
    /// One latency sample is recorded per call, including calls rejected by
    /// `checked` or by the permit pool.
    async fn run<T, F>(
        &self,
        op: BackendOp,
        checked: Result<(), BackendError>,
        work: F,
    ) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&TableInner) -> Result<T, SqlTableError> + Send + 'static,
    {
        let started = Instant::now();
        let result = self.execute(op, checked, work).await;
        self.metrics.record_latency(BACKEND_NAME, op, started.elapsed());
        if let Err(err) = &result {
            tracing::warn!(op = op.as_str(), error = %err, "sqlite table operation failed");
        }
        result
    }

    /// Validates, waits for a permit, and runs `work` on a blocking thread.
    async fn execute<T, F>(
        &self,
        op: BackendOp,
        checked: Result<(), BackendError>,
        work: F,
    ) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&TableInner) -> Result<T, SqlTableError> + Send + 'static,
    {
        checked?;
        let permit = self.permits.acquire().await?;
        let inner = Arc::clone(&self.inner);
        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work(&inner)
        })
        .await;
        match joined {
            Ok(outcome) => outcome.map_err(|err| BackendError::operation(op, err)),
            Err(err) => Err(BackendError::Worker {
                op,
                message: err.to_string(),
            }),
        }
    }
}

#[async_trait]
impl PhysicalBackend for SqliteTableBackend {
    #[tracing::instrument(name = "put", skip_all, fields(key = %entry.key))]
    async fn put(&self, entry: Entry) -> Result<(), BackendError> {
        let checked = validate_key(&entry.key);
        self.run(BackendOp::Put, checked, move |inner| inner.put(&entry)).await
    }

    #[tracing::instrument(name = "get", skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Entry>, BackendError> {
        let key = key.to_string();
        self.run(BackendOp::Get, validate_key(&key), move |inner| inner.get(&key)).await
    }

    #[tracing::instrument(name = "delete", skip(self))]
    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        let key = key.to_string();
        self.run(BackendOp::Delete, validate_key(&key), move |inner| inner.delete(&key)).await
    }

    #[tracing::instrument(name = "list", skip(self))]
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BackendError> {
        let prefix = prefix.to_string();
        self.run(BackendOp::List, Ok(()), move |inner| inner.list(&prefix)).await
    }
}
