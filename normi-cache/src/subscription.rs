//! Subscription handles.

use crate::cache::Inner;
use normi_types::QueryKey;
use std::fmt;
use std::sync::{Arc, PoisonError, Weak};

/// A subscriber callback. Takes no arguments: it is a signal to re-read.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SubscriberId(pub(crate) u64);

/// Handle returned by [`NormiCache::subscribe`](crate::NormiCache::subscribe).
///
/// Dropping the handle does not unsubscribe; call [`unsubscribe`] to stop
/// receiving notifications. The handle is cheap to clone so a callback can
/// hold a copy and remove itself.
///
/// [`unsubscribe`]: Subscription::unsubscribe
#[derive(Clone)]
pub struct Subscription {
    cache: Weak<Inner>,
    query: QueryKey,
    id: SubscriberId,
}

impl Subscription {
    pub(crate) fn new(cache: &Arc<Inner>, query: QueryKey, id: SubscriberId) -> Self {
        Self {
            cache: Arc::downgrade(cache),
            query,
            id,
        }
    }

    /// Removes this callback. Safe to call more than once, and from inside
    /// the callback itself; a notification already in progress still runs
    /// to completion.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.cache.upgrade() {
            inner
                .store
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .unsubscribe(&self.query, self.id);
        }
    }

    /// The query this subscription listens to.
    #[must_use]
    pub fn query_key(&self) -> &QueryKey {
        &self.query
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("query", &self.query)
            .field("id", &self.id.0)
            .finish()
    }
}
