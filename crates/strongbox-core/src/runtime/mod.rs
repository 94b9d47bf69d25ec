// crates/strongbox-core/src/runtime/mod.rs
// ============================================================================
// Module: Strongbox Runtime
// Description: Permit pool, in-memory backend, and telemetry hooks.
// Purpose: Provide the shared runtime pieces every backend builds on.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! Runtime modules hold the machinery shared by backends: the permit pool
//! that bounds in-flight store operations, the metrics sink that receives
//! per-operation timings, and an in-memory backend used by tests.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod permits;
pub mod store;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use permits::DEFAULT_PARALLEL_OPERATIONS;
pub use permits::Permit;
pub use permits::PermitPool;
pub use store::InMemoryBackend;
