//! Core type definitions for the Normi normalized cache.
//!
//! This crate defines the identity types shared by producers and consumers of
//! normalized payloads:
//! - [`EntityKey`] derived from an entity's `$ty` tag and `$id`
//! - [`QueryKey`] derived from a query name and its input
//! - Canonical JSON rendering for composite identifiers
//! - [`Object`] and [`Envelope`] for emitting tagged payloads
//!
//! Storage, normalization, and invalidation live in `normi-cache`.

mod canonical;
mod keys;
mod object;

pub use canonical::{canonicalize, to_canonical_string};
pub use keys::{derive_key, EntityKey, QueryKey, ID_FIELD, TYPE_FIELD};
pub use object::{to_entity, Envelope, Object, DATA_FIELD, REFS_FIELD};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid key: {0}")]
    InvalidKey(#[from] InvalidKeyError),

    #[error("type '{0}' does not serialize to a JSON object")]
    NotAnObject(String),
}

/// Raised when an entity key cannot be derived from a `$ty`/`$id` pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidKeyError {
    /// The `$id` was null or missing.
    #[error("cannot derive entity key for type '{type_tag}' with an empty id")]
    EmptyId { type_tag: String },

    /// The `$ty` was not a non-empty string.
    #[error("type tag must be a non-empty string, got {0}")]
    InvalidTypeTag(String),
}
