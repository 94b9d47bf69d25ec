// crates/strongbox-core/tests/inmem_backend.rs
// ============================================================================
// Module: In-Memory Backend Tests
// Description: Contract behaviour of the in-memory physical backend.
// Purpose: Validate get/put/delete/list semantics and metrics delivery.
// ============================================================================

//! ## Overview
//! The in-memory backend is the reference for the backend contract; these
//! tests pin the same properties the durable backends must satisfy.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use proptest::prelude::*;
use strongbox_core::BackendError;
use strongbox_core::BackendMetrics;
use strongbox_core::BackendOp;
use strongbox_core::Entry;
use strongbox_core::InMemoryBackend;
use strongbox_core::MAX_KEY_BYTES;
use strongbox_core::PhysicalBackend;
use strongbox_core::collapse_listing;

// ============================================================================
// SECTION: Helpers
// ============================================================================

#[derive(Default)]
struct RecordingMetrics {
    samples: Mutex<Vec<(&'static str, BackendOp)>>,
}

impl BackendMetrics for RecordingMetrics {
    fn record_latency(&self, backend: &'static str, op: BackendOp, _latency: Duration) {
        self.samples.lock().expect("samples").push((backend, op));
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn missing_key_is_absent_without_error() {
    let backend = InMemoryBackend::new();
    assert_eq!(backend.get("never/written").await.expect("get"), None);
}

#[tokio::test]
async fn put_then_get_round_trips_bytes() {
    let backend = InMemoryBackend::new();
    let value = vec![0_u8, 255, 10, 13, 0];
    backend.put(Entry::new("bin/blob", value.clone())).await.expect("put");
    let entry = backend.get("bin/blob").await.expect("get").expect("present");
    assert_eq!(entry.key, "bin/blob");
    assert_eq!(entry.value, value);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let backend = InMemoryBackend::new();
    backend.put(Entry::new("k", b"v".to_vec())).await.expect("put");
    backend.delete("k").await.expect("delete");
    backend.delete("k").await.expect("second delete");
    assert_eq!(backend.get("k").await.expect("get"), None);
}

#[tokio::test]
async fn list_collapses_nested_keys() {
    let backend = InMemoryBackend::new();
    for key in ["a/b", "a/c", "a/d/e", "a/d/f", "b/x"] {
        backend.put(Entry::new(key, b"v".to_vec())).await.expect("put");
    }
    assert_eq!(backend.list("a/").await.expect("list"), vec!["b", "c", "d/"]);
    assert_eq!(backend.list("").await.expect("list"), vec!["a/", "b/"]);
    assert!(backend.list("zzz/").await.expect("list").is_empty());
}

#[tokio::test]
async fn oversized_key_is_rejected() {
    let backend = InMemoryBackend::new();
    let result = backend.put(Entry::new("k".repeat(MAX_KEY_BYTES + 1), Vec::<u8>::new())).await;
    assert!(matches!(result, Err(BackendError::InvalidKey(_))));
}

#[tokio::test]
async fn every_operation_reports_one_sample() {
    let metrics = Arc::new(RecordingMetrics::default());
    let backend =
        InMemoryBackend::new().with_metrics(Arc::clone(&metrics) as Arc<dyn BackendMetrics>);
    backend.put(Entry::new("a", b"1".to_vec())).await.expect("put");
    backend.get("a").await.expect("get");
    backend.list("").await.expect("list");
    backend.delete("a").await.expect("delete");
    let rejected = backend.delete("").await;
    assert!(matches!(rejected, Err(BackendError::InvalidKey(_))));
    let samples = metrics.samples.lock().expect("samples").clone();
    assert_eq!(samples, vec![
        ("inmem", BackendOp::Put),
        ("inmem", BackendOp::Get),
        ("inmem", BackendOp::List),
        ("inmem", BackendOp::Delete),
        ("inmem", BackendOp::Delete),
    ]);
}

proptest! {
    #[test]
    fn listing_is_sorted_unique_and_one_level_deep(
        keys in proptest::collection::vec("[a-c]{1,2}(/[a-c]{1,2}){0,3}", 0 .. 24)
    ) {
        let listing = collapse_listing("", &keys);
        let mut sorted = listing.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(&listing, &sorted);
        for child in &listing {
            let separators = child.matches('/').count();
            prop_assert!(separators == 0 || (separators == 1 && child.ends_with('/')));
        }
        for key in &keys {
            let head =
                key.split_once('/').map_or_else(|| key.clone(), |(first, _)| format!("{first}/"));
            prop_assert!(listing.contains(&head));
        }
    }
}
