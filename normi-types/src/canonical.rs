//! Canonical JSON rendering for deterministic key derivation.
//!
//! Object fields are emitted in sorted order at every depth and the output is
//! compact, so two structurally equal values always render to the same string
//! regardless of field insertion order.

use serde_json::{Map, Value};

/// Returns a copy of `value` with every object's fields in sorted order.
#[must_use]
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::with_capacity(entries.len());
            for (field, inner) in entries {
                sorted.insert(field.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Renders `value` as compact canonical JSON.
#[must_use]
pub fn to_canonical_string(value: &Value) -> String {
    canonicalize(value).to_string()
}
