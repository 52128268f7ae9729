//! Classification of payload nodes.
//!
//! Every node is sorted into exactly one variant before the normalizer or
//! denormalizer touches it, so both walks are exhaustive matches rather than
//! ad-hoc field probing.

use normi_types::{ID_FIELD, TYPE_FIELD};
use serde_json::{json, Map, Value};

/// A payload node, classified.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Node<'a> {
    /// An object carrying both `$ty` and `$id`.
    Entity {
        type_tag: &'a Value,
        id: &'a Value,
        node: &'a Map<String, Value>,
    },
    Object(&'a Map<String, Value>),
    Array(&'a [Value]),
    Scalar(&'a Value),
}

impl<'a> Node<'a> {
    pub(crate) fn classify(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => match (map.get(TYPE_FIELD), map.get(ID_FIELD)) {
                (Some(type_tag), Some(id)) => Node::Entity {
                    type_tag,
                    id,
                    node: map,
                },
                _ => Node::Object(map),
            },
            Value::Array(items) => Node::Array(items),
            scalar => Node::Scalar(scalar),
        }
    }
}

/// Iterates an entity node's fields, skipping the marker fields.
pub(crate) fn entity_fields<'a>(
    node: &'a Map<String, Value>,
) -> impl Iterator<Item = (&'a String, &'a Value)> {
    node.iter()
        .filter(|(field, _)| field.as_str() != TYPE_FIELD && field.as_str() != ID_FIELD)
}

/// Builds the reference marker that stands in for a stored entity.
pub(crate) fn reference(type_tag: &Value, id: &Value) -> Value {
    json!({ TYPE_FIELD: type_tag, ID_FIELD: id })
}
