//! Devtools bridge.
//!
//! Store mutations can be mirrored to an external inspector by injecting a
//! [`CacheObserver`] at construction. Observers only watch; the cache behaves
//! identically with [`NoopObserver`], which is the default.

use normi_types::QueryKey;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, trace};

/// What caused a store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeLabel {
    /// A local change applied through [`NormiCache::mutate`](crate::NormiCache::mutate).
    Mutate { reason: String },
    /// A query response ingested through
    /// [`NormiCache::ingest_response`](crate::NormiCache::ingest_response).
    QueryResponse { query_key: QueryKey },
}

impl fmt::Display for ChangeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeLabel::Mutate { reason } => f.write_str(reason),
            ChangeLabel::QueryResponse { query_key } => write!(f, "query response {query_key}"),
        }
    }
}

/// Receives `(label, full cache snapshot)` after each effective mutation.
pub trait CacheObserver: Send + Sync {
    /// Whether snapshots should be built at all. Returning false skips the
    /// snapshot cost entirely.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Called after a mutation that changed at least one entity.
    fn on_change(&self, label: &ChangeLabel, snapshot: &Map<String, Value>);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CacheObserver for NoopObserver {
    fn is_enabled(&self) -> bool {
        false
    }

    fn on_change(&self, _label: &ChangeLabel, _snapshot: &Map<String, Value>) {}
}

/// Observer that mirrors mutations into `tracing` under the `normi::devtools`
/// target. The snapshot itself is emitted at trace level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn on_change(&self, label: &ChangeLabel, snapshot: &Map<String, Value>) {
        debug!(target: "normi::devtools", %label, entities = snapshot.len(), "cache changed");
        let rendered = Value::Object(snapshot.clone());
        trace!(target: "normi::devtools", %label, snapshot = %rendered, "cache snapshot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tracing_observer_renders_snapshot_at_trace_level() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();
        let Value::Object(snapshot) = json!({"org-org-1": {"name": "Acme"}}) else {
            unreachable!()
        };
        let label = ChangeLabel::Mutate {
            reason: "rename".to_string(),
        };

        tracing::subscriber::with_default(subscriber, || {
            TracingObserver.on_change(&label, &snapshot);
        });
        assert!(TracingObserver.is_enabled());
        assert!(!NoopObserver.is_enabled());
    }
}
