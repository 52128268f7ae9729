//! Producer-side helpers for emitting normalized payloads.
//!
//! A query resolver returns typed values; implementing [`Object`] lets them be
//! tagged with `$ty`/`$id` so the cache can extract them. [`Envelope`] bundles
//! a primary `$data` value with a `$refs` list of extra entities the response
//! depends on.

use crate::keys::{ID_FIELD, TYPE_FIELD};
use crate::{Error, InvalidKeyError, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// Field carrying the primary data of an envelope.
pub const DATA_FIELD: &str = "$data";

/// Field carrying the extra entity list of an envelope.
pub const REFS_FIELD: &str = "$refs";

/// A type that is normalized as an entity.
///
/// ```
/// use normi_types::{to_entity, Object};
/// use serde::Serialize;
/// use serde_json::{json, Value};
///
/// #[derive(Serialize)]
/// struct User {
///     id: String,
///     name: String,
/// }
///
/// impl Object for User {
///     const TYPE: &'static str = "user";
///
///     fn id(&self) -> Value {
///         json!(self.id)
///     }
/// }
///
/// let user = User { id: "1".into(), name: "Monty".into() };
/// let tagged = to_entity(&user).unwrap();
/// assert_eq!(tagged["$ty"], "user");
/// assert_eq!(tagged["$id"], "1");
/// assert_eq!(tagged["name"], "Monty");
/// ```
pub trait Object: Serialize {
    /// Type tag written to `$ty`.
    const TYPE: &'static str;

    /// Identifier written to `$id`. Composite ids return an array or object.
    fn id(&self) -> Value;
}

/// Serializes `object` and tags it with `$ty` and `$id`.
pub fn to_entity<T: Object + ?Sized>(object: &T) -> Result<Value> {
    let id = object.id();
    if id.is_null() {
        return Err(InvalidKeyError::EmptyId {
            type_tag: T::TYPE.to_string(),
        }
        .into());
    }

    let mut fields = match serde_json::to_value(object)? {
        Value::Object(fields) => fields,
        _ => return Err(Error::NotAnObject(T::TYPE.to_string())),
    };
    fields.insert(TYPE_FIELD.to_string(), Value::String(T::TYPE.to_string()));
    fields.insert(ID_FIELD.to_string(), id);
    Ok(Value::Object(fields))
}

/// A response carrying primary data plus a list of referenced entities.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    data: Value,
    refs: Vec<Value>,
}

impl Envelope {
    /// Creates an envelope around an untagged value.
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self {
            data,
            refs: Vec::new(),
        }
    }

    /// Creates an envelope whose primary data is a tagged entity.
    pub fn from_object<T: Object + ?Sized>(object: &T) -> Result<Self> {
        Ok(Self::new(to_entity(object)?))
    }

    /// Adds an entity to the `$refs` list.
    pub fn with_ref<T: Object + ?Sized>(mut self, object: &T) -> Result<Self> {
        self.refs.push(to_entity(object)?);
        Ok(self)
    }

    /// Adds every entity in `objects` to the `$refs` list.
    pub fn with_refs<'a, T, I>(mut self, objects: I) -> Result<Self>
    where
        T: Object + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        for object in objects {
            self.refs.push(to_entity(object)?);
        }
        Ok(self)
    }

    /// Returns the primary data.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the tagged entities in the `$refs` list.
    #[must_use]
    pub fn refs(&self) -> &[Value] {
        &self.refs
    }

    /// Renders the envelope as `{ "$data": ..., "$refs": [...] }`.
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut out = Map::with_capacity(2);
        out.insert(DATA_FIELD.to_string(), self.data);
        out.insert(REFS_FIELD.to_string(), Value::Array(self.refs));
        Value::Object(out)
    }
}
