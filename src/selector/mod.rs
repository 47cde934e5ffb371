//! Path selectors addressing locations inside the store's value tree.
//!
//! A selector is an immutable key sequence plus an opaque identity. Equality
//! and hashing only look at the keys, so two selectors built independently
//! for the same path address the same listeners.

mod path_ops;

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    store::StoreError,
    value::{Key, Value, canonical_index},
};

static NEXT_SELECTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a selector instance.
///
/// Survives [`PathSelector::with_keys`] so callers can correlate a selector
/// across rebuilds; never participates in equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectorId(u64);

impl SelectorId {
    fn next() -> Self {
        Self(NEXT_SELECTOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An ordered key sequence identifying a location in the value tree.
#[derive(Clone)]
pub struct PathSelector {
    keys: Vec<Key>,
    id: SelectorId,
}

impl PathSelector {
    /// Creates a selector from a key sequence.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            id: SelectorId::next(),
        }
    }

    /// The selector addressing the whole store.
    pub fn root() -> Self {
        Self {
            keys: Vec::new(),
            id: SelectorId::next(),
        }
    }

    /// Parses a dot-separated path such as `"user.name"` or `"items.0.title"`.
    ///
    /// Canonical decimal segments (`0`, `12`, not `01`) become [`Key::Index`];
    /// every other segment is a [`Key::Name`]. The empty
    /// string is the root selector.
    ///
    /// # Errors
    /// * `StoreError::InvalidPathSyntax` - If the path contains an empty segment
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        if path.is_empty() {
            return Ok(Self::root());
        }

        let keys = path
            .split('.')
            .map(|segment| {
                if segment.is_empty() {
                    return Err(StoreError::InvalidPathSyntax {
                        path: path.to_string(),
                        reason: "empty segment".to_string(),
                    });
                }

                Ok(match canonical_index(segment) {
                    Some(index) => Key::Index(index),
                    None => Key::Name(segment.to_string()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            keys,
            id: SelectorId::next(),
        })
    }

    /// The key sequence.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// The identity of this selector instance.
    pub fn id(&self) -> SelectorId {
        self.id
    }

    /// Whether this selector addresses the whole store.
    pub fn is_root(&self) -> bool {
        self.keys.is_empty()
    }

    /// Rebuilds the selector with a different key sequence, keeping its id.
    pub fn with_keys<I, K>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            id: self.id,
        }
    }

    /// A new selector one level below this one.
    pub fn child(&self, key: impl Into<Key>) -> Self {
        let mut keys = self.keys.clone();
        keys.push(key.into());
        Self::new(keys)
    }

    /// A new selector one level above this one, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        self.keys
            .split_last()
            .map(|(_, parents)| Self::new(parents.iter().cloned()))
    }

    /// Whether this path is a prefix of (or equal to) `other`.
    pub fn is_prefix_of(&self, other: &PathSelector) -> bool {
        other.keys.starts_with(&self.keys)
    }

    /// Reads the value at this path, or `None` if any step is missing.
    pub fn read(&self, root: &Value) -> Option<Value> {
        path_ops::navigate(root, &self.keys).cloned()
    }

    /// Assigns `new_value` at this path inside `root`.
    ///
    /// Intermediate containers must already exist; only the final key may be
    /// new, and only when its container is a mapping.
    ///
    /// # Errors
    /// * `StoreError::InvalidSelector` - If this is the root selector
    /// * `StoreError::BrokenPath` - If an intermediate container is missing
    pub fn write(&self, root: &mut Value, new_value: Value) -> Result<(), StoreError> {
        path_ops::set_value_at_path(root, &self.keys, new_value)
    }
}

/// Renders keys in dotted form.
pub(crate) fn display_path(keys: &[Key]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

impl PartialEq for PathSelector {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys
    }
}

impl Eq for PathSelector {}

impl Hash for PathSelector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.keys.hash(state);
    }
}

impl fmt::Debug for PathSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathSelector")
            .field("path", &display_path(&self.keys))
            .field("id", &self.id)
            .finish()
    }
}

impl fmt::Display for PathSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.keys.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&display_path(&self.keys))
        }
    }
}

impl FromStr for PathSelector {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
