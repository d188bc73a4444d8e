// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::{SharedPublisher, SharedSubscription, StreamItem, Subscriber, SubscriptionCell};
use braid_error::BraidError;
use futures::Stream;
use pin_project::pin_project;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A [`Stream`] over the signals of a publisher.
///
/// Requests `prefetch` items when created and `prefetch` more every time that many items
/// were consumed, so at most `prefetch` items are ever queued. An upstream error is
/// yielded as the last item; completion ends the stream. Dropping the stream cancels the
/// subscription.
#[pin_project]
pub struct PublisherStream<T> {
    #[pin]
    receiver: async_channel::Receiver<StreamItem<T>>,
    guard: CancelOnDrop,
    prefetch: u64,
    consumed: u64,
}

impl<T: Send + 'static> PublisherStream<T> {
    /// Subscribes to `publisher`. A `prefetch` of zero is treated as one.
    pub fn new(publisher: &SharedPublisher<T>, prefetch: u64) -> Self {
        let prefetch = prefetch.max(1);
        let (sender, receiver) = async_channel::unbounded();
        let cell = Arc::new(SubscriptionCell::new());
        publisher.subscribe(Arc::new(ChannelSubscriber {
            sender,
            cell: Arc::clone(&cell),
            prefetch,
        }));
        Self {
            receiver,
            guard: CancelOnDrop(cell),
            prefetch,
            consumed: 0,
        }
    }
}

impl<T> Stream for PublisherStream<T> {
    type Item = StreamItem<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let item = match this.receiver.poll_next(cx) {
            Poll::Ready(item) => item,
            Poll::Pending => return Poll::Pending,
        };
        if let Some(StreamItem::Value(_)) = item {
            *this.consumed += 1;
            if *this.consumed == *this.prefetch {
                *this.consumed = 0;
                this.guard.0.request(*this.prefetch);
            }
        }
        Poll::Ready(item)
    }
}

/// Method-call syntax for [`PublisherStream::new`].
pub trait IntoStreamExt<T> {
    /// Subscribes and returns a stream of the publisher's signals.
    fn into_stream(self, prefetch: u64) -> PublisherStream<T>;
}

impl<T: Send + 'static> IntoStreamExt<T> for SharedPublisher<T> {
    fn into_stream(self, prefetch: u64) -> PublisherStream<T> {
        PublisherStream::new(&self, prefetch)
    }
}

struct CancelOnDrop(Arc<SubscriptionCell>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

struct ChannelSubscriber<T> {
    sender: async_channel::Sender<StreamItem<T>>,
    cell: Arc<SubscriptionCell>,
    prefetch: u64,
}

impl<T: Send + 'static> Subscriber<T> for ChannelSubscriber<T> {
    fn on_subscribe(&self, subscription: SharedSubscription) {
        if self.cell.set(subscription) {
            self.cell.request(self.prefetch);
        }
    }

    fn on_next(&self, item: T) {
        // A closed channel means the stream was dropped; cancellation is on its way.
        let _ = self.sender.try_send(StreamItem::Value(item));
    }

    fn on_error(&self, error: BraidError) {
        let _ = self.sender.try_send(StreamItem::Error(error));
        self.sender.close();
        self.cell.release();
    }

    fn on_complete(&self) {
        self.sender.close();
        self.cell.release();
    }
}
