//! Tree index of listeners keyed by path segments.
//!
//! A write at path `P` reaches listeners registered at `P`, at any prefix of
//! `P`, and at any extension of `P`. Siblings and unrelated paths are never
//! touched. Replacing the whole store reaches every listener.

mod dispatch;
mod node;


use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use dispatch::NotifyReport;
pub(crate) use dispatch::deliver;
use node::{ListenerNode, Removal};

use crate::{store::StoreChange, value::Key};

/// Function invoked when a change reaches a listener.
pub type Callback = Arc<dyn Fn(&StoreChange) + Send + Sync>;

/// Identifies one registration in a [`ListenerTree`].
///
/// Registering the same callback twice yields two ids, each removable on its
/// own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered callback together with its id.
#[derive(Clone)]
pub struct Listener {
    /// Registration id
    pub id: ListenerId,
    /// Callback to invoke
    pub callback: Callback,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish()
    }
}

/// Order of the two passes run for a scoped write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOrder {
    /// Listeners at the path and below first, then those on its prefixes.
    #[default]
    SubtreeFirst,
    /// Listeners on the path's prefixes first, then the path and below.
    AncestorsFirst,
}

/// Listener index mirroring the shape of registered paths.
#[derive(Debug, Default)]
pub struct ListenerTree {
    root: ListenerNode,
    next_id: u64,
    len: usize,
}

impl ListenerTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` at `path`, creating nodes as needed.
    pub fn register(&mut self, path: &[Key], callback: Callback) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);

        self.root
            .descend_or_create(path)
            .push(Listener { id, callback });
        self.len += 1;

        debug!(listener = %id, depth = path.len(), "registered listener");
        id
    }

    /// Removes listener `id` from `path` and prunes nodes left empty.
    ///
    /// Returns `false` when the path or the listener is not there; that is
    /// not an error.
    pub fn deregister(&mut self, path: &[Key], id: ListenerId) -> bool {
        match self.root.remove(path, id) {
            Removal::Missing => false,
            Removal::Removed { pruned } => {
                self.len -= 1;
                debug!(listener = %id, pruned, "deregistered listener");
                true
            }
        }
    }

    /// Snapshot of the listeners a write at `path` reaches, in delivery order.
    pub fn collect(&self, path: &[Key], order: PassOrder) -> Vec<Listener> {
        let mut out = Vec::new();

        match order {
            PassOrder::SubtreeFirst => {
                self.collect_subtree(path, &mut out);
                self.collect_ancestors(path, &mut out);
            }
            PassOrder::AncestorsFirst => {
                self.collect_ancestors(path, &mut out);
                self.collect_subtree(path, &mut out);
            }
        }

        out
    }

    /// Snapshot of every listener, pre-order.
    pub fn collect_all(&self) -> Vec<Listener> {
        let mut out = Vec::with_capacity(self.len);
        self.root.collect_preorder(&mut out);
        out
    }

    /// Delivers `change` to every listener a write at `path` reaches.
    pub fn notify(&self, path: &[Key], order: PassOrder, change: &StoreChange) -> NotifyReport {
        deliver(&self.collect(path, order), change)
    }

    /// Delivers `change` to every listener in the tree.
    pub fn notify_all(&self, change: &StoreChange) -> NotifyReport {
        deliver(&self.collect_all(), change)
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes, counting the root.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// The terminal node and everything below it. Contributes nothing if the
    /// path is not fully present.
    fn collect_subtree(&self, path: &[Key], out: &mut Vec<Listener>) {
        if let Some(node) = self.root.descend(path) {
            node.collect_preorder(out);
        }
    }

    /// Own listeners of every strict prefix of `path`, root first.
    fn collect_ancestors(&self, path: &[Key], out: &mut Vec<Listener>) {
        let mut node = &self.root;

        for key in path {
            out.extend(node.listeners().iter().cloned());

            match node.child(key) {
                Some(child) => node = child,
                None => break,
            }
        }
    }
}
