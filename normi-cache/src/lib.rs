//! Normalized client-side query cache.
//!
//! Query responses often mention the same record many times: a user appears
//! in a member list, as an owner, and in its own detail query. This crate
//! stores each tagged entity once and lets every query refer to it:
//!
//! - **Normalize**: entities marked with `$ty`/`$id` are extracted into the
//!   store and replaced by reference markers; each query records which
//!   entities its result includes.
//! - **Denormalize**: reference markers are resolved against the current
//!   store when a query is read.
//! - **Invalidate**: a mutation updates the store, works out which entities
//!   really changed (structural equality, not identity), and notifies the
//!   subscribers of every dependent query exactly once.
//!
//! The cache has no transport of its own. A fetch layer hands it resolved
//! payloads, and a UI layer subscribes and re-reads.
//!
//! # Example
//!
//! ```
//! use normi_cache::{CacheConfig, NormiCache};
//! use normi_types::QueryKey;
//! use serde_json::json;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let cache = NormiCache::new(CacheConfig::default());
//! let query = QueryKey::new("orgs.get");
//!
//! let stored = cache
//!     .ingest_response(&query, &json!({"$ty": "org", "$id": "org-1", "name": "Acme"}))
//!     .unwrap();
//!
//! let hits = Arc::new(AtomicUsize::new(0));
//! let counter = hits.clone();
//! let subscription = cache.subscribe(&query, move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! cache
//!     .mutate(&json!({"$ty": "org", "$id": "org-1", "name": "Acme Inc"}), None)
//!     .unwrap();
//!
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! assert_eq!(cache.denormalize(&stored), json!({"name": "Acme Inc"}));
//! subscription.unsubscribe();
//! ```

mod cache;
mod config;
mod denormalize;
mod equality;
mod error;
mod node;
mod normalize;
mod observer;
mod store;
mod subscription;

pub use cache::{Invalidation, NormiCache};
pub use config::CacheConfig;
pub use equality::{objects_equal, structurally_equal};
pub use error::{NormiError, NormiResult};
pub use normalize::Normalized;
pub use observer::{CacheObserver, ChangeLabel, NoopObserver, TracingObserver};
pub use store::EntityValue;
pub use subscription::{Callback, Subscription};
