use std::{fmt, time::Instant};

use crate::{
    listener_tree::ListenerId,
    selector::{PathSelector, display_path},
    value::{Key, Value},
};

/// Opaque token that advances on every successful mutation of a store.
///
/// Collaborators compare versions to decide whether a cached read is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u64);

impl Version {
    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Raw counter value, for logging and display.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// What kind of mutation produced a [`StoreChange`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    /// The whole root was replaced; every listener is notified.
    Replace,
    /// A single location was written.
    Write {
        /// The value assigned at the change path.
        value: Value,
    },
}

/// Describes a mutation to the listeners it reaches.
///
/// Listeners registered on an ancestor or descendant of `path` receive the
/// same change as listeners on `path` itself.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    /// Location that was written; the root selector for replacements.
    pub path: PathSelector,
    /// Mutation that happened.
    pub kind: ChangeKind,
    /// Store version after the mutation.
    pub version: Version,
    /// When the mutation was applied.
    pub timestamp: Instant,
}

impl StoreChange {
    /// Creates a change describing a whole-root replacement.
    pub fn replaced(version: Version) -> Self {
        Self {
            path: PathSelector::root(),
            kind: ChangeKind::Replace,
            version,
            timestamp: Instant::now(),
        }
    }

    /// Creates a change describing a scoped write.
    pub fn written(path: PathSelector, value: Value, version: Version) -> Self {
        Self {
            path,
            kind: ChangeKind::Write { value },
            version,
            timestamp: Instant::now(),
        }
    }

    /// Whether this change came from a whole-root replacement.
    pub fn is_replace(&self) -> bool {
        matches!(self.kind, ChangeKind::Replace)
    }

    /// The written value, if this is a scoped write.
    pub fn value(&self) -> Option<&Value> {
        match &self.kind {
            ChangeKind::Write { value } => Some(value),
            ChangeKind::Replace => None,
        }
    }
}

/// Errors surfaced to the caller of a store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The selector cannot be used for the requested operation.
    #[error("invalid selector: {reason}")]
    InvalidSelector {
        /// Why the selector was rejected
        reason: String,
    },

    /// An intermediate container along a write path is missing.
    #[error("broken path at '{path}' (segment '{segment}'): {reason}")]
    BrokenPath {
        /// Path walked up to and including the failing segment
        path: String,
        /// The segment that could not be followed
        segment: String,
        /// What was found instead
        reason: String,
    },

    /// A dotted path string could not be parsed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPathSyntax {
        /// The rejected input
        path: String,
        /// Reason why the input is invalid
        reason: String,
    },

    /// Source and target of a propagation overlap, which would feed back.
    #[error("cannot propagate from '{from}' to '{to}': paths overlap")]
    OverlappingPaths {
        /// Source path
        from: String,
        /// Target path
        to: String,
    },

    /// Store configuration could not be read or parsed.
    #[error("failed to load store config from {location}: {details}")]
    Config {
        /// File path or "string"
        location: String,
        /// Underlying error details
        details: String,
    },
}

impl StoreError {
    pub(crate) fn broken_path(path: &[Key], segment: &Key, reason: impl Into<String>) -> Self {
        StoreError::BrokenPath {
            path: display_path(path),
            segment: segment.to_string(),
            reason: reason.into(),
        }
    }
}

/// A listener that failed while a change was being delivered.
///
/// Failures are isolated: delivery to the remaining listeners continues and
/// the failures are returned in a [`NotifyReport`](crate::NotifyReport).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("listener {listener} panicked while handling change at '{path}': {message}")]
pub struct CallbackInvocationError {
    /// Listener that failed
    pub listener: ListenerId,
    /// Change path being delivered
    pub path: String,
    /// Panic message
    pub message: String,
}
