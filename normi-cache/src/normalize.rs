//! Normalizer. Extracts tagged entities from a payload into the store.
//!
//! The walk is depth-first. Nested entities are upserted before the entity
//! that contains them, and each entity's stored fields hold reference markers
//! in place of nested entities, so one stored entity is shared by every query
//! and every parent that mentions it.
//!
//! A payload is checked in full before the first write. An invalid key or a
//! malformed envelope anywhere in it leaves the store untouched, so a failed
//! update never half-applies.

use crate::error::{NormiError, NormiResult};
use crate::node::{entity_fields, reference, Node};
use crate::store::{EntityValue, Store};
use normi_types::{EntityKey, QueryKey, DATA_FIELD, REFS_FIELD};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Result of normalizing one payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// The payload with every entity replaced by a `{ "$ty", "$id" }` marker.
    /// For envelopes this is the normalized `$data` field.
    pub stored: Value,
    /// Entities whose stored value changed.
    pub changed: BTreeSet<EntityKey>,
    /// Every entity the payload mentioned, changed or not.
    pub encountered: BTreeSet<EntityKey>,
}

pub(crate) fn normalize(
    store: &mut Store,
    query: Option<&QueryKey>,
    payload: &Value,
) -> NormiResult<Normalized> {
    validate(payload)?;

    let mut walker = Normalizer {
        store,
        query,
        changed: BTreeSet::new(),
        encountered: BTreeSet::new(),
    };

    let stored = match envelope(payload) {
        Some(map) => walker.envelope(map)?,
        None => walker.walk(payload)?,
    };

    Ok(Normalized {
        stored,
        changed: walker.changed,
        encountered: walker.encountered,
    })
}

fn envelope(payload: &Value) -> Option<&Map<String, Value>> {
    match Node::classify(payload) {
        Node::Object(map) if map.contains_key(REFS_FIELD) || map.contains_key(DATA_FIELD) => {
            Some(map)
        }
        _ => None,
    }
}

/// Read-only pass over `payload` that fails on anything the walk would
/// reject.
fn validate(payload: &Value) -> NormiResult<()> {
    if let Some(refs) = envelope(payload).and_then(|map| map.get(REFS_FIELD)) {
        let refs = refs.as_array().ok_or_else(|| {
            NormiError::InvalidPayload(format!("`{REFS_FIELD}` must be an array"))
        })?;
        for entry in refs {
            if !matches!(Node::classify(entry), Node::Entity { .. }) {
                return Err(NormiError::InvalidPayload(format!(
                    "`{REFS_FIELD}` entries must be tagged entities, got {entry}"
                )));
            }
        }
    }
    validate_keys(payload)
}

fn validate_keys(value: &Value) -> NormiResult<()> {
    match Node::classify(value) {
        Node::Entity { type_tag, id, node } => {
            EntityKey::from_marker(type_tag, id)?;
            entity_fields(node).try_for_each(|(_, inner)| validate_keys(inner))
        }
        Node::Object(map) => map.values().try_for_each(validate_keys),
        Node::Array(items) => items.iter().try_for_each(validate_keys),
        Node::Scalar(_) => Ok(()),
    }
}

struct Normalizer<'a> {
    store: &'a mut Store,
    query: Option<&'a QueryKey>,
    changed: BTreeSet<EntityKey>,
    encountered: BTreeSet<EntityKey>,
}

impl Normalizer<'_> {
    /// Handles `{ "$data": ..., "$refs": [...] }`.
    ///
    /// Every `$refs` entry is registered whether or not it also appears in
    /// `$data`.
    fn envelope(&mut self, map: &Map<String, Value>) -> NormiResult<Value> {
        let refs = map.get(REFS_FIELD).and_then(Value::as_array);
        for entry in refs.into_iter().flatten() {
            self.walk(entry)?;
        }

        match map.get(DATA_FIELD) {
            Some(data) => self.walk(data),
            None => {
                let rest = map
                    .iter()
                    .filter(|(field, _)| field.as_str() != REFS_FIELD)
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect();
                self.walk(&Value::Object(rest))
            }
        }
    }

    fn walk(&mut self, value: &Value) -> NormiResult<Value> {
        match Node::classify(value) {
            Node::Entity { type_tag, id, node } => {
                let key = EntityKey::from_marker(type_tag, id)?;

                let mut fields = EntityValue::new();
                for (field, inner) in entity_fields(node) {
                    fields.insert(field.clone(), self.walk(inner)?);
                }

                if self.store.upsert(key.clone(), fields) {
                    self.changed.insert(key.clone());
                }
                if let Some(query) = self.query {
                    self.store.add_dependency(key.clone(), query.clone());
                }
                self.encountered.insert(key);

                Ok(reference(type_tag, id))
            }
            Node::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (field, inner) in map {
                    out.insert(field.clone(), self.walk(inner)?);
                }
                Ok(Value::Object(out))
            }
            Node::Array(items) => items
                .iter()
                .map(|item| self.walk(item))
                .collect::<NormiResult<Vec<_>>>()
                .map(Value::Array),
            Node::Scalar(scalar) => Ok(scalar.clone()),
        }
    }
}
