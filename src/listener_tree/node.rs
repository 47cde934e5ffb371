use std::collections::BTreeMap;

use tracing::trace;

use super::{Listener, ListenerId};
use crate::value::Key;

/// One node of the listener tree.
///
/// Nodes mirror the shape of registered paths, not the stored data. Children
/// are owned through the key map, so the tree has no parent links.
#[derive(Debug, Default)]
pub(super) struct ListenerNode {
    listeners: Vec<Listener>,
    children: BTreeMap<Key, ListenerNode>,
}

/// Outcome of removing a listener below a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Removal {
    /// The path or the listener was not there.
    Missing,
    /// The listener was removed; `pruned` nodes were dropped on the way up.
    Removed { pruned: usize },
}

impl ListenerNode {
    pub(super) fn is_empty(&self) -> bool {
        self.listeners.is_empty() && self.children.is_empty()
    }

    pub(super) fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    pub(super) fn push(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub(super) fn child(&self, key: &Key) -> Option<&ListenerNode> {
        self.children.get(key)
    }

    /// Follows `path` without creating nodes.
    pub(super) fn descend(&self, path: &[Key]) -> Option<&ListenerNode> {
        path.iter().try_fold(self, |node, key| node.children.get(key))
    }

    /// Follows `path`, creating empty nodes where missing.
    pub(super) fn descend_or_create(&mut self, path: &[Key]) -> &mut ListenerNode {
        path.iter().fold(self, |node, key| {
            node.children.entry(key.clone()).or_default()
        })
    }

    /// Removes listener `id` at `path` below this node, pruning children that
    /// end up with neither listeners nor children.
    ///
    /// Each recursion level holds its (parent, key) pair on the stack, so the
    /// unwinding walks the same chain as the descent.
    pub(super) fn remove(&mut self, path: &[Key], id: ListenerId) -> Removal {
        let Some((key, rest)) = path.split_first() else {
            let before = self.listeners.len();
            self.listeners.retain(|listener| listener.id != id);

            return if self.listeners.len() == before {
                Removal::Missing
            } else {
                Removal::Removed { pruned: 0 }
            };
        };

        let Some(child) = self.children.get_mut(key) else {
            return Removal::Missing;
        };

        match child.remove(rest, id) {
            Removal::Removed { pruned } if child.is_empty() => {
                self.children.remove(key);
                trace!(key = %key, "pruned empty listener node");
                Removal::Removed { pruned: pruned + 1 }
            }
            outcome => outcome,
        }
    }

    /// Collects this node's listeners and every descendant's, pre-order.
    pub(super) fn collect_preorder(&self, out: &mut Vec<Listener>) {
        out.extend(self.listeners.iter().cloned());

        for child in self.children.values() {
            child.collect_preorder(out);
        }
    }

    pub(super) fn node_count(&self) -> usize {
        1 + self
            .children
            .values()
            .map(ListenerNode::node_count)
            .sum::<usize>()
    }
}
