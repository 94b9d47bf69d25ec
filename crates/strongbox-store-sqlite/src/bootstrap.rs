// crates/strongbox-store-sqlite/src/bootstrap.rs
// ============================================================================
// Module: SQLite Table Bootstrap
// Description: Idempotent database, schema, and table provisioning.
// Purpose: Bring a fresh or existing location to a usable table layout.
// Dependencies: rusqlite, tracing
// ============================================================================

//! ## Overview
//! Bootstrap runs three steps in order, each safe to repeat:
//!
//! 1. open (creating if needed) the main database file,
//! 2. attach the schema database when the schema is not `main`,
//! 3. create the key/value table if it does not exist.
//!
//! Schema attachment is per connection in `SQLite`, so step 2 runs on every
//! pooled connection while step 3 runs once. A database without a backing
//! file is private to one connection, so the pool holds only that one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::config::DatabaseTarget;
use crate::config::SqlTableConfig;
use crate::identifiers::SqlIdentifier;
use crate::store::BootstrapStep;
use crate::store::SqlTableError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Validated names for one table location.
#[derive(Debug, Clone)]
pub(crate) struct TableNames {
    /// Database name.
    pub(crate) database: SqlIdentifier,
    /// Schema name.
    pub(crate) schema: SqlIdentifier,
    /// Table name.
    pub(crate) table: SqlIdentifier,
}

impl TableNames {
    /// Validates every configured name.
    pub(crate) fn from_config(config: &SqlTableConfig) -> Result<Self, SqlTableError> {
        Ok(Self {
            database: SqlIdentifier::parse("database", &config.database)?,
            schema: SqlIdentifier::parse_schema(&config.schema)?,
            table: SqlIdentifier::parse("table", &config.table)?,
        })
    }

    /// Returns true when the table lives in the main database.
    pub(crate) fn is_main_schema(&self) -> bool {
        self.schema.as_str().eq_ignore_ascii_case("main")
    }

    /// Returns the `"schema"."table"` reference used in statements.
    pub(crate) fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema.quoted(), self.table.quoted())
    }
}

// ============================================================================
// SECTION: Step 1 - Database
// ============================================================================

/// Opens the main database, creating the file and its directory if needed.
pub(crate) fn open_database(
    config: &SqlTableConfig,
    names: &TableNames,
) -> Result<Connection, SqlTableError> {
    let step = BootstrapStep::CreateDatabase;
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = match &config.target {
        DatabaseTarget::Directory(dir) => {
            fs::create_dir_all(dir).map_err(|err| step.fail(err))?;
            let path = dir.join(format!("{}.db", names.database));
            Connection::open_with_flags(path, flags).map_err(|err| step.fail(err))?
        }
        DatabaseTarget::Url(url) => {
            Connection::open_with_flags(url, flags | OpenFlags::SQLITE_OPEN_URI)
                .map_err(|err| step.fail(err))?
        }
    };
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies connection pragmas.
fn apply_pragmas(connection: &Connection, config: &SqlTableConfig) -> Result<(), SqlTableError> {
    let step = BootstrapStep::Configure;
    connection.busy_timeout(config.busy_timeout).map_err(|err| step.fail(err))?;
    connection.execute_batch("PRAGMA journal_mode = wal;").map_err(|err| step.fail(err))?;
    Ok(())
}

// ============================================================================
// SECTION: Step 2 - Schema
// ============================================================================

/// Attaches the schema database to `connection` unless already present.
pub(crate) fn ensure_schema(
    connection: &Connection,
    names: &TableNames,
) -> Result<(), SqlTableError> {
    if names.is_main_schema() {
        return Ok(());
    }
    let present: Option<i64> = connection
        .query_row(
            "SELECT 1 FROM pragma_database_list WHERE name = ?1",
            params![names.schema.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| BootstrapStep::CheckSchema.fail(err))?;
    if present.is_some() {
        return Ok(());
    }

    let step = BootstrapStep::CreateSchema;
    let main_file = main_database_file(connection)?;
    let schema_file = schema_file_for(&main_file, names);
    connection
        .execute(
            &format!("ATTACH DATABASE ?1 AS {}", names.schema.quoted()),
            params![schema_file.to_string_lossy().into_owned()],
        )
        .map_err(|err| step.fail(err))?;
    connection
        .execute_batch(&format!("PRAGMA {}.journal_mode = wal;", names.schema.quoted()))
        .map_err(|err| step.fail(err))?;
    tracing::debug!(
        schema = %names.schema,
        file = %schema_file.display(),
        "attached schema database"
    );
    Ok(())
}

/// Returns the file name `SQLite` reports for the main database.
///
/// The name is empty for in-memory and temporary databases.
fn main_file_name(connection: &Connection) -> rusqlite::Result<String> {
    connection.query_row("SELECT file FROM pragma_database_list WHERE name = 'main'", [], |row| {
        row.get(0)
    })
}

/// Returns true when other connections opening the same target reach the
/// same database.
///
/// In-memory and temporary databases are private to the connection that
/// opened them.
pub(crate) fn is_file_backed(connection: &Connection) -> Result<bool, SqlTableError> {
    let file = main_file_name(connection).map_err(|err| BootstrapStep::Configure.fail(err))?;
    Ok(!file.is_empty())
}

/// Returns the file backing the main database.
fn main_database_file(connection: &Connection) -> Result<PathBuf, SqlTableError> {
    let file = main_file_name(connection).map_err(|err| BootstrapStep::CreateSchema.fail(err))?;
    if file.is_empty() {
        return Err(BootstrapStep::CreateSchema.fail("schema requires a file-backed database"));
    }
    Ok(PathBuf::from(file))
}

/// Derives `<dir>/<database stem>.<schema>.db` from the main database file.
fn schema_file_for(main_file: &Path, names: &TableNames) -> PathBuf {
    let stem = main_file
        .file_stem()
        .map_or_else(|| names.database.to_string(), |stem| stem.to_string_lossy().into_owned());
    main_file.with_file_name(format!("{stem}.{}.db", names.schema))
}

// ============================================================================
// SECTION: Step 3 - Table
// ============================================================================

/// Creates the key/value table if it does not exist.
pub(crate) fn ensure_table(
    connection: &Connection,
    names: &TableNames,
) -> Result<(), SqlTableError> {
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {} (Path VARCHAR(512) NOT NULL PRIMARY KEY CHECK \
         (length(CAST(Path AS BLOB)) <= 512), Value BLOB NOT NULL)",
        names.qualified_table()
    );
    connection.execute_batch(&sql).map_err(|err| BootstrapStep::CreateTable.fail(err))
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "Test-only assertions and helpers are permitted.")]
mod tests {
    use std::path::Path;

    use super::TableNames;
    use super::schema_file_for;
    use crate::config::SqlTableConfig;

    #[test]
    fn schema_file_sits_next_to_main_file() {
        let mut config = SqlTableConfig::in_directory("/data");
        config.schema = "kv".to_string();
        let names = TableNames::from_config(&config).expect("names");
        let file = schema_file_for(Path::new("/data/Vault.db"), &names);
        assert_eq!(file, Path::new("/data/Vault.kv.db"));
        assert_eq!(names.qualified_table(), "\"kv\".\"Vault\"");
    }

    #[test]
    fn main_schema_is_case_insensitive() {
        let mut config = SqlTableConfig::in_directory("/data");
        config.schema = "MAIN".to_string();
        let names = TableNames::from_config(&config).expect("names");
        assert!(names.is_main_schema());
    }
}
