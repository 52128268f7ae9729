//! Identifier types used throughout the Normi cache.
//!
//! Entity keys take the form `{type}-{id}`. Scalar ids are rendered as plain
//! text (strings unquoted); composite ids are rendered as canonical JSON.

use crate::canonical::to_canonical_string;
use crate::{InvalidKeyError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::borrow::Borrow;
use std::fmt;

/// Field carrying an entity's type tag.
pub const TYPE_FIELD: &str = "$ty";

/// Field carrying an entity's identifier.
pub const ID_FIELD: &str = "$id";

/// Derives the entity key for a `(type_tag, id)` pair.
pub fn derive_key(type_tag: &str, id: &Value) -> std::result::Result<EntityKey, InvalidKeyError> {
    EntityKey::derive(type_tag, id)
}

/// Identity of a normalized entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    /// Derives a key from a type tag and an identifier value.
    pub fn derive(type_tag: &str, id: &Value) -> std::result::Result<Self, InvalidKeyError> {
        if type_tag.is_empty() {
            return Err(InvalidKeyError::InvalidTypeTag("\"\"".to_string()));
        }

        let id = match id {
            Value::Null => {
                return Err(InvalidKeyError::EmptyId {
                    type_tag: type_tag.to_string(),
                });
            }
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            composite @ (Value::Array(_) | Value::Object(_)) => to_canonical_string(composite),
        };

        Ok(Self(format!("{type_tag}-{id}")))
    }

    /// Derives a key from the raw `$ty` and `$id` values of a payload node.
    pub fn from_marker(type_tag: &Value, id: &Value) -> std::result::Result<Self, InvalidKeyError> {
        match type_tag {
            Value::String(tag) => Self::derive(tag, id),
            other => Err(InvalidKeyError::InvalidTypeTag(other.to_string())),
        }
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntityKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identity of one logical query invocation (name plus input).
///
/// Rendered as canonical JSON of `[name]` or `[name, input]`, so equal inputs
/// with differently ordered fields share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(String);

impl QueryKey {
    /// Key for a query that takes no input.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(to_canonical_string(&json!([name])))
    }

    /// Key for a query invoked with `input`.
    pub fn with_input<T: Serialize + ?Sized>(name: &str, input: &T) -> Result<Self> {
        let input = serde_json::to_value(input)?;
        Ok(Self(to_canonical_string(&json!([name, input]))))
    }

    /// Wraps an already-derived key string.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QueryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for QueryKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
