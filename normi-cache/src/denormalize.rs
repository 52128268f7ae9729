//! Denormalizer. Resolves reference markers against the store.

use crate::node::Node;
use crate::store::Store;
use normi_types::EntityKey;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::warn;

/// Returns a copy of `value` with every reference replaced by the stored
/// entity, itself resolved recursively.
///
/// Dangling references and references back into an entity that is already
/// being resolved become `null`. The output contains no markers, so running
/// it through again is a no-op.
pub(crate) fn denormalize(store: &Store, value: &Value, warn_on_dangling: bool) -> Value {
    Denormalizer {
        store,
        warn_on_dangling,
        resolving: HashSet::new(),
    }
    .resolve(value)
}

struct Denormalizer<'a> {
    store: &'a Store,
    warn_on_dangling: bool,
    resolving: HashSet<EntityKey>,
}

impl Denormalizer<'_> {
    fn resolve(&mut self, value: &Value) -> Value {
        match Node::classify(value) {
            Node::Entity { type_tag, id, .. } => {
                let key = match EntityKey::from_marker(type_tag, id) {
                    Ok(key) => key,
                    Err(err) => {
                        warn!("Normi: unresolvable reference in payload: {err}");
                        return Value::Null;
                    }
                };
                self.resolve_entity(key)
            }
            Node::Object(map) => Value::Object(
                map.iter()
                    .map(|(field, inner)| (field.clone(), self.resolve(inner)))
                    .collect(),
            ),
            Node::Array(items) => Value::Array(items.iter().map(|item| self.resolve(item)).collect()),
            Node::Scalar(scalar) => scalar.clone(),
        }
    }

    fn resolve_entity(&mut self, key: EntityKey) -> Value {
        let store = self.store;
        let Some(fields) = store.get(&key) else {
            if self.warn_on_dangling {
                warn!("Normi: couldn't find key '{key}' in cache but it was used in operation");
            }
            return Value::Null;
        };

        if !self.resolving.insert(key.clone()) {
            warn!("Normi: reference cycle through '{key}', cutting at repeated entity");
            return Value::Null;
        }

        let mut out = Map::with_capacity(fields.len());
        for (field, inner) in fields {
            out.insert(field.clone(), self.resolve(inner));
        }

        self.resolving.remove(&key);
        Value::Object(out)
    }
}
