// crates/strongbox-core/src/interfaces/mod.rs
// ============================================================================
// Module: Strongbox Interfaces
// Description: Backend-agnostic contract for physical storage.
// Purpose: Define the operations every physical backend must provide.
// Dependencies: async-trait, thiserror
// ============================================================================

//! ## Overview
//! [`PhysicalBackend`] is the seam between credential-store logic and the
//! bytes-on-disk layer. Implementations must be safe for concurrent use and
//! must distinguish a missing key from a failed lookup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

use crate::core::Entry;
use crate::runtime::telemetry::BackendOp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Physical backend operation errors.
///
/// # Invariants
/// - A missing key is never reported through this type; `get` returns
///   `Ok(None)` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The store rejected or failed the operation.
    #[error("{op} failed: {message}")]
    Operation {
        /// Operation that failed.
        op: BackendOp,
        /// Store-reported failure text.
        message: String,
    },
    /// The key violates key constraints.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// The permit pool was closed while waiting.
    #[error("permit pool closed")]
    Closed,
    /// The blocking worker running the operation did not complete.
    #[error("{op} worker failed: {message}")]
    Worker {
        /// Operation that was running.
        op: BackendOp,
        /// Join failure text.
        message: String,
    },
}

impl BackendError {
    /// Builds an operation error from any displayable store failure.
    pub fn operation(op: BackendOp, error: impl std::fmt::Display) -> Self {
        Self::Operation {
            op,
            message: error.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Physical Backend
// ============================================================================

/// Flat key/value store with hierarchical prefix listing.
///
/// Concurrent `put`/`delete` calls on the same key are applied in the store's
/// own serialisation order: the last applied write wins, or the store reports
/// an error. No stronger ordering is promised.
#[async_trait]
pub trait PhysicalBackend: Send + Sync {
    /// Stores `entry`, replacing any existing value for its key.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the key is invalid or the store fails.
    async fn put(&self, entry: Entry) -> Result<(), BackendError>;

    /// Loads the entry for `key`.
    ///
    /// Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the key is invalid or the store fails.
    async fn get(&self, key: &str) -> Result<Option<Entry>, BackendError>;

    /// Removes `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the key is invalid or the store fails.
    async fn delete(&self, key: &str) -> Result<(), BackendError>;

    /// Lists the children of `prefix` in ascending order.
    ///
    /// Children ending in `/` are intermediate namespace nodes.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the store fails.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BackendError>;
}
