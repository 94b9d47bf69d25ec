// crates/strongbox-store-sqlite/src/statements.rs
// ============================================================================
// Module: SQLite Statement Registry
// Description: The fixed statement set used by the table backend.
// Purpose: Build statement text once and compile it on every connection.
// Dependencies: rusqlite
// ============================================================================

//! ## Overview
//! Statement text is fixed at construction from the validated table name.
//! [`Statements::prepare_on`] compiles every statement into the connection's
//! statement cache so later executions via `prepare_cached` reuse the
//! compiled form. A statement that fails to compile fails construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;

use crate::store::SqlTableError;

// ============================================================================
// SECTION: Statement Names
// ============================================================================

/// Names of the registered statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatementName {
    /// Upsert one entry.
    Put,
    /// Read one value.
    Get,
    /// Delete one entry.
    Delete,
    /// Scan keys by prefix.
    List,
}

impl StatementName {
    /// Every statement, in registration order.
    pub(crate) const ALL: [Self; 4] = [Self::Put, Self::Get, Self::Delete, Self::List];

    /// Returns the stable statement label.
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::Get => "get",
            Self::Delete => "delete",
            Self::List => "list",
        }
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Immutable statement text for one table.
#[derive(Debug, Clone)]
pub(crate) struct Statements {
    /// Upsert statement.
    put: String,
    /// Point read statement.
    get: String,
    /// Delete statement.
    delete: String,
    /// Prefix scan statement.
    list: String,
}

impl Statements {
    /// Builds statement text for `qualified_table`.
    pub(crate) fn new(qualified_table: &str) -> Self {
        Self {
            put: format!(
                "INSERT INTO {qualified_table} (Path, Value) VALUES (?1, ?2) ON CONFLICT (Path) DO \
                 UPDATE SET Value = excluded.Value"
            ),
            get: format!("SELECT Value FROM {qualified_table} WHERE Path = ?1"),
            delete: format!("DELETE FROM {qualified_table} WHERE Path = ?1"),
            // Literal, case-sensitive prefix match: % and _ are ordinary characters.
            list: format!(
                "SELECT Path FROM {qualified_table} WHERE Path >= ?1 AND substr(Path, 1, \
                 length(?1)) = ?1 ORDER BY Path"
            ),
        }
    }

    /// Returns the text of `name`.
    pub(crate) fn sql(&self, name: StatementName) -> &str {
        match name {
            StatementName::Put => &self.put,
            StatementName::Get => &self.get,
            StatementName::Delete => &self.delete,
            StatementName::List => &self.list,
        }
    }

    /// Compiles every statement into the connection's statement cache.
    pub(crate) fn prepare_on(&self, connection: &Connection) -> Result<(), SqlTableError> {
        for name in StatementName::ALL {
            connection.prepare_cached(self.sql(name)).map_err(|err| SqlTableError::Prepare {
                name: name.as_str(),
                message: err.to_string(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "Test-only assertions and helpers are permitted.")]
mod tests {
    use rusqlite::Connection;

    use super::Statements;
    use crate::store::SqlTableError;

    #[test]
    fn preparing_against_a_missing_table_names_the_statement() {
        let connection = Connection::open_in_memory().expect("open");
        let statements = Statements::new("\"main\".\"absent\"");
        let err = statements.prepare_on(&connection).expect_err("missing table");
        assert!(matches!(err, SqlTableError::Prepare { name: "put", .. }));
    }

    #[test]
    fn statements_compile_against_the_table_layout() {
        let connection = Connection::open_in_memory().expect("open");
        connection
            .execute_batch("CREATE TABLE kv (Path VARCHAR(512) PRIMARY KEY, Value BLOB)")
            .expect("create");
        Statements::new("\"main\".\"kv\"").prepare_on(&connection).expect("prepare");
    }
}
