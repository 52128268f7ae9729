//! Cache configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a [`NormiCache`](crate::NormiCache).
///
/// Deserializes with defaults for missing fields, so a host can embed it in
/// its own settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Return the process-wide shared cache instead of a fresh one.
    pub context_sharing: bool,
    /// Catch subscriber panics, log them, and keep notifying the rest.
    pub isolate_subscriber_panics: bool,
    /// Log a warning when denormalizing a reference with no stored entity.
    pub warn_on_dangling: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            context_sharing: false,
            isolate_subscriber_panics: false,
            warn_on_dangling: true,
        }
    }
}

impl CacheConfig {
    /// Configuration selecting the shared process-wide cache.
    #[must_use]
    pub fn shared() -> Self {
        Self {
            context_sharing: true,
            ..Self::default()
        }
    }
}
