// crates/strongbox-core/src/lib.rs
// ============================================================================
// Module: Strongbox Core Library
// Description: Public API surface for the Strongbox physical storage core.
// Purpose: Expose entry types, backend interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Strongbox core defines the physical storage contract used by credential
//! stores: a flat key/value namespace with hierarchical prefix listing, a
//! bounded permit pool for throttling store operations, and the lease capping
//! rule applied when renewable credentials are extended. It is
//! backend-agnostic; relational and in-memory backends plug in through
//! [`PhysicalBackend`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use interfaces::BackendError;
pub use interfaces::PhysicalBackend;
pub use runtime::DEFAULT_PARALLEL_OPERATIONS;
pub use runtime::InMemoryBackend;
pub use runtime::Permit;
pub use runtime::PermitPool;
pub use runtime::telemetry::BackendMetrics;
pub use runtime::telemetry::BackendOp;
pub use runtime::telemetry::NoopMetrics;
