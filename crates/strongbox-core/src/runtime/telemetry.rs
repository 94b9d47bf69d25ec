// crates/strongbox-core/src/runtime/telemetry.rs
// ============================================================================
// Module: Strongbox Telemetry
// Description: Timing hooks for physical backend operations.
// Purpose: Deliver per-operation latency samples without hard metrics deps.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Backends report one latency sample per operation to a [`BackendMetrics`]
//! sink, labelled with the backend name and the [`BackendOp`]. Deployments
//! plug in their own exporter; [`NoopMetrics`] discards samples.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::Serialize;

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Physical backend operation classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendOp {
    /// Entry write.
    Put,
    /// Entry read.
    Get,
    /// Entry removal.
    Delete,
    /// Prefix listing.
    List,
}

impl BackendOp {
    /// Returns a stable label for the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::Get => "get",
            Self::Delete => "delete",
            Self::List => "list",
        }
    }
}

impl fmt::Display for BackendOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for physical backend operations.
pub trait BackendMetrics: Send + Sync {
    /// Records how long one operation took, permit wait included.
    fn record_latency(&self, backend: &'static str, op: BackendOp, latency: Duration);
}

/// No-op metrics sink.
///
/// # Invariants
/// - Samples are discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl BackendMetrics for NoopMetrics {
    fn record_latency(&self, _backend: &'static str, _op: BackendOp, _latency: Duration) {}
}
