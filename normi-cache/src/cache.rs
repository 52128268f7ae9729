//! The cache handle and its invalidation pipeline.
//!
//! All operations are synchronous and each one runs to completion under the
//! store lock. The lock is released before any subscriber callback or observer
//! runs, so callbacks may read from the cache and unsubscribe freely.
//! Mutating the cache from inside a callback is not supported: the fan-out of
//! the outer mutation has already been computed and will not see it.

use crate::config::CacheConfig;
use crate::denormalize::denormalize;
use crate::equality::objects_equal;
use crate::error::{NormiError, NormiResult};
use crate::normalize::{normalize, Normalized};
use crate::observer::{CacheObserver, ChangeLabel, NoopObserver};
use crate::store::{EntityValue, Store};
use crate::subscription::{Callback, Subscription};
use normi_types::{EntityKey, QueryKey};
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::BTreeSet;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error};

static SHARED: OnceLock<NormiCache> = OnceLock::new();

pub(crate) struct Inner {
    pub(crate) store: RwLock<Store>,
    observer: Arc<dyn CacheObserver>,
    config: CacheConfig,
}

/// Outcome of a local mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invalidation {
    /// Entities whose stored value changed.
    pub changed: BTreeSet<EntityKey>,
    /// Queries whose subscribers were notified, in notification order.
    pub notified: BTreeSet<QueryKey>,
}

/// A normalized query cache. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct NormiCache {
    inner: Arc<Inner>,
}

impl Default for NormiCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl NormiCache {
    /// Creates a cache with the no-op observer.
    ///
    /// With `config.context_sharing` set, returns the process-wide shared
    /// cache instead, creating it on first use.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    /// Creates a cache that mirrors its mutations to `observer`.
    ///
    /// The shared cache keeps the configuration and observer it was first
    /// created with; later calls with `context_sharing` only return a handle.
    pub fn with_observer(config: CacheConfig, observer: Arc<dyn CacheObserver>) -> Self {
        if config.context_sharing {
            return SHARED
                .get_or_init(|| Self::isolated(config, observer))
                .clone();
        }
        Self::isolated(config, observer)
    }

    fn isolated(config: CacheConfig, observer: Arc<dyn CacheObserver>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: RwLock::new(Store::default()),
                observer,
                config,
            }),
        }
    }

    /// Returns the configuration this cache was created with.
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Returns true if both handles point at the same cache.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.inner.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.inner.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Store access ─────────────────────────────────────────────

    /// Returns a copy of the stored entity, without resolving its references.
    pub fn get(&self, key: &EntityKey) -> Option<Value> {
        self.read().get(key).cloned().map(Value::Object)
    }

    /// Shallow-merges `partial` into the entity at `key`.
    ///
    /// Returns whether the stored value changed. Does not notify anyone; use
    /// [`mutate`](Self::mutate) for a change that should reach subscribers.
    pub fn upsert(&self, key: EntityKey, partial: EntityValue) -> bool {
        self.write().upsert(key, partial)
    }

    /// Records that `query`'s result includes `entity`. Idempotent.
    pub fn add_dependency(&self, entity: EntityKey, query: QueryKey) {
        self.write().add_dependency(entity, query);
    }

    /// Queries that depend on `entity`, in key order.
    pub fn dependents(&self, entity: &EntityKey) -> Vec<QueryKey> {
        self.read()
            .dependents(entity)
            .map(|queries| queries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of stored entities.
    pub fn entity_count(&self) -> usize {
        self.read().entity_count()
    }

    /// The whole entity mapping as a JSON object keyed by entity key.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.read().snapshot()
    }

    /// Drops every entity, dependency, and subscription.
    pub fn clear(&self) {
        self.write().clear();
        debug!("Normi cache cleared");
    }

    // ── Subscriptions ────────────────────────────────────────────

    /// Registers `callback` for notifications about `query`.
    ///
    /// The returned handle must be used to unsubscribe; dropping it leaves
    /// the callback registered.
    pub fn subscribe<F>(&self, query: &QueryKey, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        let id = self.write().subscribe(query.clone(), callback);
        Subscription::new(&self.inner, query.clone(), id)
    }

    /// Number of live subscribers for `query`.
    pub fn subscriber_count(&self, query: &QueryKey) -> usize {
        self.read().subscriber_count(query)
    }

    /// Returns true while `query` has at least one subscriber.
    pub fn has_subscribers(&self, query: &QueryKey) -> bool {
        self.read().has_subscriptions(query)
    }

    /// Invokes every callback registered for `query`, in registration order.
    ///
    /// Callbacks registered or removed while this runs take effect on the
    /// next notification. A panicking callback propagates to the caller
    /// unless `isolate_subscriber_panics` is configured.
    pub fn notify(&self, query: &QueryKey) {
        let callbacks = self.read().subscribers(query);
        if callbacks.is_empty() {
            return;
        }

        debug!("Notifying {} subscriber(s) of {}", callbacks.len(), query);
        for callback in callbacks {
            if self.inner.config.isolate_subscriber_panics {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback())) {
                    error!(
                        "Normi: subscriber of {} panicked: {}",
                        query,
                        panic_message(payload.as_ref())
                    );
                }
            } else {
                callback();
            }
        }
    }

    // ── Normalization ────────────────────────────────────────────

    /// Extracts the entities of `payload` into the store under `query`.
    ///
    /// The whole payload is validated first; on error the store is left
    /// untouched.
    ///
    /// Records a dependency from every entity the payload mentions to
    /// `query`. Does not notify subscribers; see
    /// [`ingest_response`](Self::ingest_response).
    pub fn normalize(&self, query: &QueryKey, payload: &Value) -> NormiResult<Normalized> {
        let normalized = normalize(&mut self.write(), Some(query), payload)?;
        debug!(
            "Normalized {}: {} entities, {} changed",
            query,
            normalized.encountered.len(),
            normalized.changed.len()
        );
        Ok(normalized)
    }

    /// Resolves every reference in `payload` against the current store.
    ///
    /// A reference with no stored entity resolves to `null` in place: an
    /// object field keeps its name with a `null` value and an array keeps
    /// the slot, so the shape of the payload is preserved. Reference cycles
    /// are cut the same way at the repeated entity.
    pub fn denormalize(&self, payload: &Value) -> Value {
        denormalize(&self.read(), payload, self.inner.config.warn_on_dangling)
    }

    // ── Invalidation ─────────────────────────────────────────────

    /// Applies a local change and notifies every query depending on an
    /// entity it changed, exactly once each.
    ///
    /// `reason` labels the change for the observer and defaults to `mutate`.
    pub fn mutate(&self, payload: &Value, reason: Option<&str>) -> NormiResult<Invalidation> {
        let observe = self.inner.observer.is_enabled();
        let (changed, affected, snapshot) = {
            let mut store = self.write();
            let normalized = normalize(&mut store, None, payload)?;
            let affected = store.affected_queries(&normalized.changed);
            let snapshot = (observe && !normalized.changed.is_empty()).then(|| store.snapshot());
            (normalized.changed, affected, snapshot)
        };

        if let Some(snapshot) = snapshot {
            let label = ChangeLabel::Mutate {
                reason: reason.unwrap_or("mutate").to_string(),
            };
            self.inner.observer.on_change(&label, &snapshot);
        }

        debug!(
            "Mutation changed {} entities, invalidating {} queries",
            changed.len(),
            affected.len()
        );
        for query in &affected {
            self.notify(query);
        }

        Ok(Invalidation {
            changed,
            notified: affected,
        })
    }

    /// Ingests a resolved query response.
    ///
    /// Normalizes `payload` under `query`, then notifies every other query
    /// that depends on an entity the response changed. `query` itself is not
    /// notified: its caller already holds the fresh result. Returns the
    /// stored (reference-only) payload.
    pub fn ingest_response(&self, query: &QueryKey, payload: &Value) -> NormiResult<Value> {
        let observe = self.inner.observer.is_enabled();
        let (normalized, affected, snapshot) = {
            let mut store = self.write();
            let before = observe.then(|| store.snapshot());
            let normalized = normalize(&mut store, Some(query), payload)?;

            let mut affected = store.affected_queries(&normalized.changed);
            affected.remove(query);

            let snapshot = before.and_then(|before| {
                let after = store.snapshot();
                (!objects_equal(&before, &after, false)).then_some(after)
            });
            (normalized, affected, snapshot)
        };

        if let Some(snapshot) = snapshot {
            let label = ChangeLabel::QueryResponse {
                query_key: query.clone(),
            };
            self.inner.observer.on_change(&label, &snapshot);
        }

        debug!(
            "Response for {} touched {} entities, invalidating {} other queries",
            query,
            normalized.encountered.len(),
            affected.len()
        );
        for other in &affected {
            self.notify(other);
        }

        Ok(normalized.stored)
    }

    /// Awaits an external fetch and ingests its result as one update.
    ///
    /// The cache does not own the fetch; errors from it are returned as-is.
    pub async fn fetch_query<Fut, E>(&self, query: &QueryKey, fetch: Fut) -> Result<Value, E>
    where
        Fut: Future<Output = Result<Value, E>>,
        E: From<NormiError>,
    {
        let payload = fetch.await?;
        Ok(self.ingest_response(query, &payload)?)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
