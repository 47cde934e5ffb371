use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, info, instrument, warn};

use crate::{
    config::StoreConfig,
    listener_tree::{Callback, Listener, ListenerTree, NotifyReport, PassOrder, deliver},
    selector::PathSelector,
    value::Value,
};

use super::{ChangeStream, StoreChange, StoreError, Subscription, SubscriptionHandle, Version};

pub(super) struct StoreState {
    root: Value,
    listeners: ListenerTree,
    version: Version,
}

/// A shared hierarchical value store with path-scoped change notification.
///
/// Cloning yields another handle to the same store. Mutations are serialized
/// behind one mutex; listeners are invoked after the mutex is released, on the
/// mutating thread, so a listener may read from or write back into the store.
#[derive(Clone)]
pub struct Store {
    state: Arc<Mutex<StoreState>>,
    pass_order: PassOrder,
}

/// Non-owning handle used by subscription guards and propagation listeners.
#[derive(Clone)]
pub(super) struct WeakStore {
    state: Weak<Mutex<StoreState>>,
    pass_order: PassOrder,
}

impl WeakStore {
    pub(super) fn upgrade(&self) -> Option<Store> {
        self.state.upgrade().map(|state| Store {
            state,
            pass_order: self.pass_order,
        })
    }
}

impl Store {
    /// Creates a store holding `root` with an empty listener tree.
    pub fn new(root: impl Into<Value>) -> Self {
        Self::build(root.into(), PassOrder::default())
    }

    /// Creates a store from configuration.
    ///
    /// The configured `initial` value becomes the root; an absent one yields
    /// an empty mapping.
    pub fn with_config(config: StoreConfig) -> Self {
        let root = config.initial.unwrap_or_else(Value::mapping);
        Self::build(root, config.pass_order)
    }

    fn build(root: Value, pass_order: PassOrder) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                root,
                listeners: ListenerTree::new(),
                version: Version::default(),
            })),
            pass_order,
        }
    }

    /// Locks the state, recovering from poisoning.
    ///
    /// The root is only ever assigned after a replacement value has been
    /// fully computed, so a poisoned lock never guards a half-written root.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn downgrade(&self) -> WeakStore {
        WeakStore {
            state: Arc::downgrade(&self.state),
            pass_order: self.pass_order,
        }
    }

    /// Returns a snapshot of the current root.
    pub fn current(&self) -> Value {
        self.lock().root.clone()
    }

    /// Reads the value at `selector`, or `None` if the path is absent.
    pub fn read(&self, selector: &PathSelector) -> Option<Value> {
        selector.read(&self.lock().root)
    }

    /// The current version token.
    pub fn version(&self) -> Version {
        self.lock().version
    }

    /// The pass order used for scoped writes.
    pub fn pass_order(&self) -> PassOrder {
        self.pass_order
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Number of listener tree nodes, counting the root.
    pub fn listener_node_count(&self) -> usize {
        self.lock().listeners.node_count()
    }

    /// Replaces the whole root and notifies every listener.
    #[instrument(skip_all)]
    pub fn replace(&self, new_root: impl Into<Value>) -> NotifyReport {
        let new_root = new_root.into();
        self.replace_with(move |_| new_root)
    }

    /// Replaces the root with the result of `replacer` applied to the old one.
    ///
    /// `replacer` runs while the store is locked and must not call back into
    /// the store. If it panics the root is left untouched.
    #[instrument(skip_all)]
    pub fn replace_with<F>(&self, replacer: F) -> NotifyReport
    where
        F: FnOnce(&Value) -> Value,
    {
        match self.try_replace_with(|old| Ok::<_, std::convert::Infallible>(replacer(old))) {
            Ok(report) => report,
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`replace_with`](Self::replace_with).
    ///
    /// # Errors
    /// Returns the replacer's error unchanged; the root and version are left
    /// untouched and no listener is notified.
    #[instrument(skip_all)]
    pub fn try_replace_with<F, E>(&self, replacer: F) -> Result<NotifyReport, E>
    where
        F: FnOnce(&Value) -> Result<Value, E>,
    {
        let (listeners, change) = {
            let mut state = self.lock();
            let new_root = replacer(&state.root)?;

            state.root = new_root;
            state.version = state.version.next();

            (
                state.listeners.collect_all(),
                StoreChange::replaced(state.version),
            )
        };

        info!(version = %change.version, listeners = listeners.len(), "replaced store root");
        Ok(self.dispatch(&listeners, &change))
    }

    /// Writes `value` at `selector` and notifies listeners at that path, its
    /// prefixes and its extensions.
    ///
    /// Every notified listener observes the post-write root.
    ///
    /// # Errors
    /// * `StoreError::InvalidSelector` - If `selector` is the root selector
    /// * `StoreError::BrokenPath` - If an intermediate container is missing
    #[instrument(skip_all, fields(path = %selector))]
    pub fn write_at(
        &self,
        selector: &PathSelector,
        value: impl Into<Value>,
    ) -> Result<NotifyReport, StoreError> {
        let value = value.into();

        let (listeners, change) = {
            let mut state = self.lock();
            selector.write(&mut state.root, value.clone())?;
            state.version = state.version.next();

            (
                state.listeners.collect(selector.keys(), self.pass_order),
                StoreChange::written(selector.clone(), value, state.version),
            )
        };

        debug!(version = %change.version, listeners = listeners.len(), "scoped write applied");
        Ok(self.dispatch(&listeners, &change))
    }

    /// Registers `callback` at `selector`'s path.
    ///
    /// Each call returns a distinct handle, even for the same callback.
    pub fn subscribe<F>(&self, selector: &PathSelector, callback: F) -> SubscriptionHandle
    where
        F: Fn(&StoreChange) + Send + Sync + 'static,
    {
        self.subscribe_callback(selector, Arc::new(callback))
    }

    fn subscribe_callback(
        &self,
        selector: &PathSelector,
        callback: Callback,
    ) -> SubscriptionHandle {
        let id = self.lock().listeners.register(selector.keys(), callback);
        debug!(path = %selector, listener = %id, "subscribed");
        SubscriptionHandle::new(id)
    }

    /// Removes the registration `handle` at `selector`'s path.
    ///
    /// Returns `false` if nothing matched; unknown pairs are not an error.
    pub fn unsubscribe(&self, selector: &PathSelector, handle: SubscriptionHandle) -> bool {
        let removed = self
            .lock()
            .listeners
            .deregister(selector.keys(), handle.id());

        if removed {
            debug!(path = %selector, listener = %handle.id(), "unsubscribed");
        }

        removed
    }

    /// Like [`subscribe`](Self::subscribe), but the returned guard
    /// unsubscribes when dropped.
    pub fn subscribe_scoped<F>(&self, selector: &PathSelector, callback: F) -> Subscription
    where
        F: Fn(&StoreChange) + Send + Sync + 'static,
    {
        let handle = self.subscribe(selector, callback);
        Subscription::new(self.downgrade(), selector.clone(), handle)
    }

    /// Streams every change that reaches `selector`.
    ///
    /// Dropping the stream unsubscribes.
    pub fn watch(&self, selector: &PathSelector) -> ChangeStream {
        ChangeStream::new(self, selector)
    }

    /// Keeps `to` in sync with `from`.
    ///
    /// The current value at `from` is copied to `to` immediately (if present)
    /// and again whenever a change reaches `from`. Writes are skipped when the
    /// target already holds an equal value.
    ///
    /// # Errors
    /// * `StoreError::OverlappingPaths` - If one path is a prefix of the other,
    ///   which includes either being the root selector
    /// * `StoreError::BrokenPath` - If the initial copy cannot reach `to`
    pub fn propagate(
        &self,
        from: &PathSelector,
        to: &PathSelector,
    ) -> Result<Subscription, StoreError> {
        if from.is_prefix_of(to) || to.is_prefix_of(from) {
            return Err(StoreError::OverlappingPaths {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        sync_once(self, from, to)?;

        let weak = self.downgrade();
        let source = from.clone();
        let target = to.clone();

        Ok(self.subscribe_scoped(from, move |_| {
            let Some(store) = weak.upgrade() else {
                return;
            };

            if let Err(error) = sync_once(&store, &source, &target) {
                warn!(from = %source, to = %target, error = %error, "propagation failed");
            }
        }))
    }

    fn dispatch(&self, listeners: &[Listener], change: &StoreChange) -> NotifyReport {
        let report = deliver(listeners, change);

        if !report.is_clean() {
            warn!(
                path = %change.path,
                failed = report.failures.len(),
                delivered = report.delivered,
                "some listeners failed"
            );
        }

        report
    }
}

fn sync_once(store: &Store, from: &PathSelector, to: &PathSelector) -> Result<(), StoreError> {
    let Some(value) = store.read(from) else {
        return Ok(());
    };

    if store.read(to).as_ref() == Some(&value) {
        return Ok(());
    }

    store.write_at(to, value).map(|_| ())
}
