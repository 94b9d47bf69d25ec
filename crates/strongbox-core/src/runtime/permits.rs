// crates/strongbox-core/src/runtime/permits.rs
// ============================================================================
// Module: Strongbox Permit Pool
// Description: Bounded-concurrency gate for physical store operations.
// Purpose: Cap how many store operations may be in flight at once.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! A [`PermitPool`] hands out at most `capacity` [`Permit`] guards at a time.
//! Callers await a permit before touching the store and release it by
//! dropping the guard, so every exit path (including errors and cancelled
//! futures) returns the permit. Waiters are not served in any promised order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use tokio::sync::OwnedSemaphorePermit;
use tokio::sync::Semaphore;

use crate::interfaces::BackendError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Permit count used when no positive capacity is configured.
pub const DEFAULT_PARALLEL_OPERATIONS: usize = 128;

// ============================================================================
// SECTION: Permit Pool
// ============================================================================

/// Counting gate bounding concurrent store operations.
///
/// # Invariants
/// - Outstanding permits never exceed `capacity`.
/// - `capacity` is at least one.
#[derive(Debug, Clone)]
pub struct PermitPool {
    /// Shared semaphore holding the available permits.
    semaphore: Arc<Semaphore>,
    /// Fixed number of permits.
    capacity: usize,
}

/// Held permit; dropping it returns the permit to the pool.
#[derive(Debug)]
pub struct Permit {
    /// Underlying semaphore permit.
    _permit: OwnedSemaphorePermit,
}

impl PermitPool {
    /// Creates a pool with `capacity` permits.
    ///
    /// A capacity of zero is replaced with [`DEFAULT_PARALLEL_OPERATIONS`].
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 { DEFAULT_PARALLEL_OPERATIONS } else { capacity };
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a permit.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Closed`] if the pool was closed.
    pub async fn acquire(&self) -> Result<Permit, BackendError> {
        let permit =
            Arc::clone(&self.semaphore).acquire_owned().await.map_err(|_| BackendError::Closed)?;
        Ok(Permit {
            _permit: permit,
        })
    }

    /// Takes a permit without waiting, if one is free.
    #[must_use]
    pub fn try_acquire(&self) -> Option<Permit> {
        Arc::clone(&self.semaphore).try_acquire_owned().ok().map(|permit| Permit {
            _permit: permit,
        })
    }

    /// Returns the fixed permit count.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of permits not currently held.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for PermitPool {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_OPERATIONS)
    }
}
