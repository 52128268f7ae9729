//! Shared test helpers for cache tests.

#![allow(dead_code)]

use normi_cache::{CacheObserver, ChangeLabel, NormiCache, Subscription};
use normi_types::QueryKey;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static TRACING: Once = Once::new();

/// Installs a test-writer tracing subscriber once per test binary.
/// Honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Counts how many times a subscription fired.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self, cache: &NormiCache, query: &QueryKey) -> Subscription {
        let hits = self.0.clone();
        cache.subscribe(query, move || {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// Observer that records every change it sees.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<(ChangeLabel, Map<String, Value>)>>,
}

impl RecordingObserver {
    pub fn labels(&self) -> Vec<ChangeLabel> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(label, _)| label.clone())
            .collect()
    }

    pub fn last_snapshot(&self) -> Option<Map<String, Value>> {
        self.events
            .lock()
            .unwrap()
            .last()
            .map(|(_, snapshot)| snapshot.clone())
    }
}

impl CacheObserver for RecordingObserver {
    fn on_change(&self, label: &ChangeLabel, snapshot: &Map<String, Value>) {
        self.events
            .lock()
            .unwrap()
            .push((label.clone(), snapshot.clone()));
    }
}

/// Unwraps a JSON object literal into its field map.
pub fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
