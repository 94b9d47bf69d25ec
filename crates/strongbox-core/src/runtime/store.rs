// crates/strongbox-core/src/runtime/store.rs
// ============================================================================
// Module: Strongbox In-Memory Backend
// Description: Map-backed physical backend for tests and examples.
// Purpose: Provide a reference implementation of the backend contract.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of [`PhysicalBackend`]
//! for tests and local demos. It shares the permit pool and listing rules of
//! durable backends but keeps nothing across restarts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Instant;

use async_trait::async_trait;

use crate::core::Entry;
use crate::core::collapse_listing;
use crate::core::validate_key;
use crate::interfaces::BackendError;
use crate::interfaces::PhysicalBackend;
use crate::runtime::permits::PermitPool;
use crate::runtime::telemetry::BackendMetrics;
use crate::runtime::telemetry::BackendOp;
use crate::runtime::telemetry::NoopMetrics;

// ============================================================================
// SECTION: In-Memory Backend
// ============================================================================

/// Metrics label for this backend.
const BACKEND_NAME: &str = "inmem";

/// In-memory physical backend for tests and examples.
#[derive(Clone)]
pub struct InMemoryBackend {
    /// Entry map protected by a mutex.
    entries: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    /// Gate bounding concurrent operations.
    permits: PermitPool,
    /// Latency sink.
    metrics: Arc<dyn BackendMetrics>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Creates an empty backend with the default permit pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_permits(PermitPool::default())
    }

    /// Creates an empty backend gated by `permits`.
    #[must_use]
    pub fn with_permits(permits: PermitPool) -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
            permits,
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Replaces the metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn BackendMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns the permit pool gating this backend.
    #[must_use]
    pub const fn permits(&self) -> &PermitPool {
        &self.permits
    }

    /// Locks the entry map.
    fn lock(
        &self,
        op: BackendOp,
    ) -> Result<MutexGuard<'_, BTreeMap<String, Vec<u8>>>, BackendError> {
        self.entries
            .lock()
            .map_err(|_| BackendError::operation(op, "in-memory store mutex poisoned"))
    }

    /// Runs `work` on the map under a permit and records one latency sample,
    /// including for calls rejected by `checked` or by the pool.
    async fn run<T, F>(
        &self,
        op: BackendOp,
        checked: Result<(), BackendError>,
        work: F,
    ) -> Result<T, BackendError>
    where
        T: Send,
        F: FnOnce(&mut BTreeMap<String, Vec<u8>>) -> T + Send,
    {
        let started = Instant::now();
        let result = async {
            checked?;
            let _permit = self.permits.acquire().await?;
            let mut guard = self.lock(op)?;
            Ok(work(&mut guard))
        }
        .await;
        self.metrics.record_latency(BACKEND_NAME, op, started.elapsed());
        result
    }
}

#[async_trait]
impl PhysicalBackend for InMemoryBackend {
    async fn put(&self, entry: Entry) -> Result<(), BackendError> {
        let checked = validate_key(&entry.key);
        self.run(BackendOp::Put, checked, move |map| {
            map.insert(entry.key, entry.value);
        })
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<Entry>, BackendError> {
        self.run(BackendOp::Get, validate_key(key), |map| {
            map.get(key).map(|value| Entry::new(key, value.clone()))
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.run(BackendOp::Delete, validate_key(key), |map| {
            map.remove(key);
        })
        .await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, BackendError> {
        let result = self
            .run(BackendOp::List, Ok(()), |map| {
                let keys = map
                    .range(prefix.to_string() ..)
                    .map(|(key, _)| key.as_str())
                    .take_while(|key| key.starts_with(prefix));
                collapse_listing(prefix, keys)
            })
            .await;
        tracing::debug!(backend = BACKEND_NAME, prefix, "listed prefix");
        result
    }
}
