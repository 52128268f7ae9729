//! Structural equality for cached values.
//!
//! Decides whether an entity's replacement value differs from what is stored,
//! so identical writes do not invalidate dependent queries. The devtools path
//! uses it to skip snapshots that did not change.
//!
//! # Array comparison
//!
//! In the default (non-ordered) mode arrays are compared as sorted copies,
//! where the sort key is the JavaScript default-comparator string form of each
//! element. That is correct for arrays of scalars. Arrays of objects all share
//! the sort key `[object Object]`, so they keep their original order and are
//! effectively compared positionally. This mirrors the behaviour clients of
//! the cache already depend on and is known to be suspect for object arrays.
//!
//! Numbers are keyed with `serde_json`'s formatting, which matches the
//! JavaScript string form for integers but not for every float (`1.0` versus
//! `1`, `1e21` versus `1e+21`). Float arrays therefore sort in roughly, not
//! exactly, the order a JavaScript client would produce.

use serde_json::{Map, Number, Value};

/// Compares two values structurally.
///
/// With `preserve_order == false` arrays are compared as multisets (see the
/// module docs for the caveat on arrays of objects).
#[must_use]
pub fn structurally_equal(a: &Value, b: &Value, preserve_order: bool) -> bool {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => a.is_null() && b.is_null(),
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => arrays_equal(x, y, preserve_order),
        (Value::Object(x), Value::Object(y)) => objects_equal(x, y, preserve_order),
        _ => false,
    }
}

/// Compares two objects field by field; field order is never significant.
#[must_use]
pub fn objects_equal(a: &Map<String, Value>, b: &Map<String, Value>, preserve_order: bool) -> bool {
    a.len() == b.len()
        && a.iter().all(|(field, left)| {
            b.get(field)
                .is_some_and(|right| structurally_equal(left, right, preserve_order))
        })
}

fn arrays_equal(a: &[Value], b: &[Value], preserve_order: bool) -> bool {
    if a.len() != b.len() {
        return false;
    }

    if preserve_order {
        return a
            .iter()
            .zip(b)
            .all(|(left, right)| structurally_equal(left, right, true));
    }

    let left = sorted(a);
    let right = sorted(b);
    left.iter()
        .zip(&right)
        .all(|(left, right)| structurally_equal(left, right, false))
}

/// Stable sort by default-comparator key, on a copy of the references.
fn sorted(items: &[Value]) -> Vec<&Value> {
    let mut keyed: Vec<(String, &Value)> = items.iter().map(|v| (sort_key(v), v)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, v)| v).collect()
}

fn sort_key(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => sort_key(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    a.as_f64() == b.as_f64()
}
