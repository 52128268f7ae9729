//! The normalized store.
//!
//! Holds the three mappings the cache is built on:
//! - entity key → entity value
//! - entity key → dependent query keys
//! - query key → subscriber callbacks
//!
//! The store itself is a plain data structure with no locking; [`NormiCache`]
//! owns it behind a lock and never holds that lock while callbacks run.
//!
//! [`NormiCache`]: crate::NormiCache

use crate::equality::objects_equal;
use crate::subscription::{Callback, SubscriberId};
use normi_types::{EntityKey, QueryKey};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

/// Fields of a stored entity.
pub type EntityValue = Map<String, Value>;

#[derive(Default)]
pub(crate) struct Store {
    entities: HashMap<EntityKey, EntityValue>,
    dependencies: HashMap<EntityKey, BTreeSet<QueryKey>>,
    subscriptions: HashMap<QueryKey, Vec<(SubscriberId, Callback)>>,
    next_subscriber: u64,
}

impl Store {
    pub(crate) fn get(&self, key: &EntityKey) -> Option<&EntityValue> {
        self.entities.get(key)
    }

    /// Shallow-merges `partial` into the stored value for `key`.
    ///
    /// Returns true if the merged value differs from what was stored before.
    /// Inserting a previously absent key always counts as a change.
    pub(crate) fn upsert(&mut self, key: EntityKey, partial: EntityValue) -> bool {
        match self.entities.get_mut(&key) {
            Some(existing) => {
                let mut merged = existing.clone();
                merged.extend(partial);
                let changed = !objects_equal(existing, &merged, false);
                *existing = merged;
                changed
            }
            None => {
                self.entities.insert(key, partial);
                true
            }
        }
    }

    pub(crate) fn add_dependency(&mut self, entity: EntityKey, query: QueryKey) {
        self.dependencies.entry(entity).or_default().insert(query);
    }

    pub(crate) fn dependents(&self, entity: &EntityKey) -> Option<&BTreeSet<QueryKey>> {
        self.dependencies.get(entity)
    }

    /// Unions the dependents of every changed entity into one ordered set.
    pub(crate) fn affected_queries<'a>(
        &self,
        changed: impl IntoIterator<Item = &'a EntityKey>,
    ) -> BTreeSet<QueryKey> {
        let mut affected = BTreeSet::new();
        for key in changed {
            if let Some(queries) = self.dependencies.get(key) {
                affected.extend(queries.iter().cloned());
            }
        }
        affected
    }

    pub(crate) fn subscribe(&mut self, query: QueryKey, callback: Callback) -> SubscriberId {
        self.next_subscriber += 1;
        let id = SubscriberId(self.next_subscriber);
        self.subscriptions
            .entry(query)
            .or_default()
            .push((id, callback));
        id
    }

    /// Removes one subscriber. Drops the query entry when it was the last.
    pub(crate) fn unsubscribe(&mut self, query: &QueryKey, id: SubscriberId) -> bool {
        let Some(subscribers) = self.subscriptions.get_mut(query) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        let removed = subscribers.len() != before;
        if subscribers.is_empty() {
            self.subscriptions.remove(query);
        }
        removed
    }

    /// Snapshot of a query's callbacks in registration order.
    pub(crate) fn subscribers(&self, query: &QueryKey) -> Vec<Callback> {
        self.subscriptions
            .get(query)
            .map(|subscribers| subscribers.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn subscriber_count(&self, query: &QueryKey) -> usize {
        self.subscriptions.get(query).map_or(0, Vec::len)
    }

    pub(crate) fn has_subscriptions(&self, query: &QueryKey) -> bool {
        self.subscriptions.contains_key(query)
    }

    pub(crate) fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The whole entity mapping as a JSON object keyed by entity key.
    pub(crate) fn snapshot(&self) -> Map<String, Value> {
        self.entities
            .iter()
            .map(|(key, value)| (key.to_string(), Value::Object(value.clone())))
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.entities.clear();
        self.dependencies.clear();
        self.subscriptions.clear();
    }
}
