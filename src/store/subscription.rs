use tracing::trace;

use crate::{listener_tree::ListenerId, selector::PathSelector};

use super::store::WeakStore;

/// Token returned by [`Store::subscribe`](crate::Store::subscribe).
///
/// Pass it back to [`Store::unsubscribe`](crate::Store::unsubscribe) together
/// with the selector it was registered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: ListenerId,
}

impl SubscriptionHandle {
    pub(super) fn new(id: ListenerId) -> Self {
        Self { id }
    }

    /// The listener id behind this handle.
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

/// A subscription handle that unsubscribes when dropped.
///
/// Holds only a weak reference, so an outstanding guard never keeps a store
/// alive; dropping it after the store is gone does nothing.
pub struct Subscription {
    store: WeakStore,
    selector: PathSelector,
    handle: SubscriptionHandle,
}

impl Subscription {
    pub(super) fn new(store: WeakStore, selector: PathSelector, handle: SubscriptionHandle) -> Self {
        Self {
            store,
            selector,
            handle,
        }
    }

    /// The path this subscription listens at.
    pub fn selector(&self) -> &PathSelector {
        &self.selector
    }

    /// The underlying handle.
    pub fn handle(&self) -> SubscriptionHandle {
        self.handle
    }

    /// Unsubscribes now. Equivalent to dropping the guard.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.unsubscribe(&self.selector, self.handle);
        } else {
            trace!(path = %self.selector, "store already dropped, nothing to unsubscribe");
        }
    }
}
