// crates/strongbox-core/src/core/entry.rs
// ============================================================================
// Module: Strongbox Entries
// Description: Stored key/value pairs and key validation.
// Purpose: Define the unit of storage exchanged with physical backends.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`Entry`] is a key plus an opaque byte value. Backends receive and
//! return entries by value; there is no shared ownership between an entry and
//! the backend that stored it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::interfaces::BackendError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum key length in bytes accepted by any backend.
pub const MAX_KEY_BYTES: usize = 512;

// ============================================================================
// SECTION: Entry
// ============================================================================

/// Stored key/value pair.
///
/// # Invariants
/// - `key` is non-empty and at most [`MAX_KEY_BYTES`] bytes once stored.
/// - `value` is opaque; backends never interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique key within the backend namespace.
    pub key: String,
    /// Opaque stored bytes.
    pub value: Vec<u8>,
}

impl Entry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Validates a key before it reaches a backend.
///
/// # Errors
///
/// Returns [`BackendError::InvalidKey`] when the key is empty or longer than
/// [`MAX_KEY_BYTES`].
pub fn validate_key(key: &str) -> Result<(), BackendError> {
    if key.is_empty() {
        return Err(BackendError::InvalidKey("key must not be empty".to_string()));
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(BackendError::InvalidKey(format!(
            "key exceeds {MAX_KEY_BYTES} bytes: {} bytes",
            key.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::MAX_KEY_BYTES;
    use super::validate_key;
    use crate::interfaces::BackendError;

    #[test]
    fn key_at_limit_is_accepted() {
        assert!(validate_key(&"k".repeat(MAX_KEY_BYTES)).is_ok());
    }

    #[test]
    fn oversized_and_empty_keys_are_rejected() {
        assert!(matches!(
            validate_key(&"k".repeat(MAX_KEY_BYTES + 1)),
            Err(BackendError::InvalidKey(_))
        ));
        assert!(matches!(validate_key(""), Err(BackendError::InvalidKey(_))));
    }
}
