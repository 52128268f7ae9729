//! Error types for the cache.

use normi_types::InvalidKeyError;
use thiserror::Error;

/// Result type for cache operations.
pub type NormiResult<T> = Result<T, NormiError>;

/// Errors that can occur while normalizing a payload.
#[derive(Debug, Error)]
pub enum NormiError {
    /// An entity node carried an unusable `$ty` or `$id`.
    #[error("invalid entity key: {0}")]
    InvalidKey(#[from] InvalidKeyError),

    /// The payload does not follow the envelope convention.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
