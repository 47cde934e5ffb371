use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::selector::PathSelector;

use super::{Store, StoreChange, Subscription};

/// Stream of changes reaching one path.
///
/// Bridges the synchronous listener tree into async code: the registered
/// listener forwards each change into an unbounded channel. Dropping the
/// stream drops its [`Subscription`] and unsubscribes.
pub struct ChangeStream {
    receiver: UnboundedReceiverStream<StoreChange>,
    _subscription: Subscription,
}

impl ChangeStream {
    pub(super) fn new(store: &Store, selector: &PathSelector) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        let subscription = store.subscribe_scoped(selector, move |change| {
            let _ = sender.send(change.clone());
        });

        Self {
            receiver: UnboundedReceiverStream::new(receiver),
            _subscription: subscription,
        }
    }
}

impl Stream for ChangeStream {
    type Item = StoreChange;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().receiver).poll_next(cx)
    }
}
