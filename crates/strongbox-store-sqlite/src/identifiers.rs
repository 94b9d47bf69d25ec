// crates/strongbox-store-sqlite/src/identifiers.rs
// ============================================================================
// Module: SQL Identifiers
// Description: Allow-listed database, schema, and table names.
// Purpose: Keep configured names from injecting SQL into DDL statements.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! Configured names are interpolated into DDL and statement text, where bind
//! parameters are not allowed. Every such name passes through
//! [`SqlIdentifier::parse`] first and is emitted double-quoted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use crate::store::SqlTableError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum identifier length in bytes.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Schema names SQLite reserves for itself.
const RESERVED_SCHEMAS: [&str; 1] = ["temp"];

// ============================================================================
// SECTION: Identifier
// ============================================================================

/// Validated SQL identifier matching `[A-Za-z_][A-Za-z0-9_]{0,127}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlIdentifier(String);

impl SqlIdentifier {
    /// Validates `value` as an identifier for `kind` (database, schema, table).
    ///
    /// # Errors
    ///
    /// Returns [`SqlTableError::InvalidIdentifier`] when `value` is empty, too
    /// long, or contains characters outside the allow-list.
    pub fn parse(kind: &'static str, value: &str) -> Result<Self, SqlTableError> {
        let invalid = || SqlTableError::InvalidIdentifier {
            kind,
            value: value.to_string(),
        };
        let mut chars = value.chars();
        let Some(first) = chars.next() else {
            return Err(invalid());
        };
        if value.len() > MAX_IDENTIFIER_LENGTH {
            return Err(invalid());
        }
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(invalid());
        }
        if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(invalid());
        }
        Ok(Self(value.to_string()))
    }

    /// Validates a schema name, additionally rejecting reserved names.
    ///
    /// # Errors
    ///
    /// Returns [`SqlTableError::InvalidIdentifier`] for invalid or reserved
    /// names.
    pub fn parse_schema(value: &str) -> Result<Self, SqlTableError> {
        let identifier = Self::parse("schema", value)?;
        if RESERVED_SCHEMAS.iter().any(|reserved| reserved.eq_ignore_ascii_case(value)) {
            return Err(SqlTableError::InvalidIdentifier {
                kind: "schema",
                value: value.to_string(),
            });
        }
        Ok(identifier)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identifier wrapped in double quotes.
    #[must_use]
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for SqlIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "Test-only assertions and helpers are permitted.")]
mod tests {
    use super::SqlIdentifier;
    use crate::store::SqlTableError;

    #[test]
    fn plain_names_are_accepted_and_quoted() {
        let identifier = SqlIdentifier::parse("table", "vault_kv2").expect("valid");
        assert_eq!(identifier.quoted(), "\"vault_kv2\"");
        assert!(SqlIdentifier::parse("table", "_x").is_ok());
    }

    #[test]
    fn injection_and_odd_names_are_rejected() {
        let too_long = "a".repeat(129);
        let rejected = ["", "1abc", "a b", "t\"; DROP TABLE x; --", "a-b", "ümlaut", too_long.as_str()];
        for value in rejected {
            assert!(
                matches!(
                    SqlIdentifier::parse("table", value),
                    Err(SqlTableError::InvalidIdentifier { kind: "table", .. })
                ),
                "accepted {value}"
            );
        }
    }

    #[test]
    fn temp_schema_is_reserved() {
        assert!(SqlIdentifier::parse_schema("TEMP").is_err());
        assert!(SqlIdentifier::parse_schema("kv").is_ok());
    }
}
