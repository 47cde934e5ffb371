//! Treewatch - Path-scoped change notification over a shared value tree.
//!
//! Consumers subscribe at a path inside the store and are notified only when
//! a write touches that path, one of its ancestors, or one of its
//! descendants. The main pieces are:
//!
//! - Path selectors that read and write locations in the value tree
//! - A listener tree that indexes callbacks by path and prunes itself
//! - A store that drives notification from whole-root and scoped mutations
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//! use treewatch::{PathSelector, Store, Value};
//!
//! let store = Store::new(Value::from(serde_json::json!({
//!     "user": {"name": "Ann", "age": 30},
//!     "theme": "dark"
//! })));
//!
//! let name = PathSelector::parse("user.name").unwrap();
//! let hits = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&hits);
//! store.subscribe(&name, move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! store.write_at(&name, "Bea").unwrap();
//!
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! assert_eq!(store.read(&name), Some(Value::from("Bea")));
//! ```

/// Dynamically typed values and path keys.
pub mod value;

/// Path selectors addressing locations in the value tree.
pub mod selector;

/// Tree index of listeners keyed by path segments.
pub mod listener_tree;

/// Shared store driving notification through the listener tree.
pub mod store;

/// Store configuration loaded from TOML.
pub mod config;

/// Command-line demo around the store.
pub mod cli;

/// Structured logging setup.
pub mod tracing_config;

pub use config::StoreConfig;
pub use listener_tree::{Callback, ListenerId, ListenerTree, NotifyReport, PassOrder};
pub use selector::{PathSelector, SelectorId};
pub use store::{
    CallbackInvocationError, ChangeKind, ChangeStream, Store, StoreChange, StoreError,
    Subscription, SubscriptionHandle, Version,
};
pub use value::{Key, Value};

/// A specialized `Result` type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
