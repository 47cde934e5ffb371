//! Shared value store with path-scoped change notification.
//!
//! Owns the root value and one listener tree. Whole-root replacement notifies
//! every listener; a scoped write notifies listeners at the written path, its
//! prefixes and its extensions.

mod changes;
#[allow(clippy::module_inception)]
mod store;
mod subscription;
mod watch;

#[cfg(test)]
mod tests;

pub use changes::{CallbackInvocationError, ChangeKind, StoreChange, StoreError, Version};
pub use store::Store;
pub use subscription::{Subscription, SubscriptionHandle};
pub use watch::ChangeStream;
