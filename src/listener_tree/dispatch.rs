use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use tracing::{trace, warn};

use super::Listener;
use crate::store::{CallbackInvocationError, StoreChange};

/// Result of delivering one change to a snapshot of listeners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    /// Listeners that returned normally.
    pub delivered: usize,
    /// Listeners that panicked, in invocation order.
    pub failures: Vec<CallbackInvocationError>,
}

impl NotifyReport {
    /// Total number of listeners invoked, successful or not.
    pub fn invoked(&self) -> usize {
        self.delivered + self.failures.len()
    }

    /// Whether every listener returned normally.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Invokes every listener in order with `change`.
///
/// A panicking listener is caught and recorded; the rest still run.
pub(crate) fn deliver(listeners: &[Listener], change: &StoreChange) -> NotifyReport {
    let mut report = NotifyReport::default();

    for listener in listeners {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (listener.callback)(change)));

        match outcome {
            Ok(()) => {
                trace!(listener = %listener.id, path = %change.path, "delivered change");
                report.delivered += 1;
            }
            Err(payload) => {
                let error = CallbackInvocationError {
                    listener: listener.id,
                    path: change.path.to_string(),
                    message: panic_message(payload.as_ref()),
                };
                warn!(error = %error, "listener failed, continuing delivery");
                report.failures.push(error);
            }
        }
    }

    report
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
