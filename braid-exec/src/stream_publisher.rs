// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::logging::{debug, warn};
use braid_core::{
    DemandTracker, NoopSubscription, Publisher, SharedPublisher, SharedSubscriber, StreamItem,
    Subscription,
};
use braid_error::BraidError;
use futures::{Stream, StreamExt};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// A publisher that drives an async stream on the tokio runtime.
///
/// Every subscriber gets a fresh stream from the factory and its own task. The task
/// polls the stream only while the subscriber has outstanding demand, so a slow
/// subscriber leaves the stream suspended instead of buffering ahead. A
/// `StreamItem::Error` from the stream terminates the subscription with that error.
///
/// Subscribing outside a tokio runtime fails the subscriber with a stream error. If the
/// runtime shuts down while the task is still running, the subscriber receives
/// `BraidError::Cancelled`.
pub struct StreamPublisher<T, F> {
    factory: Arc<F>,
    _item: PhantomData<fn() -> T>,
}

impl<T, S, F> StreamPublisher<T, F>
where
    F: Fn() -> S + Send + Sync + 'static,
    S: Stream<Item = StreamItem<T>> + Send + 'static,
    T: Send + 'static,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
            _item: PhantomData,
        }
    }
}

impl<T, S, F> Publisher<T> for StreamPublisher<T, F>
where
    F: Fn() -> S + Send + Sync + 'static,
    S: Stream<Item = StreamItem<T>> + Send + 'static,
    T: Send + 'static,
{
    fn subscribe(&self, subscriber: SharedSubscriber<T>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("from_stream subscribed outside of a tokio runtime");
            subscriber.on_subscribe(Arc::new(NoopSubscription));
            subscriber.on_error(BraidError::stream_error(
                "from_stream requires a running tokio runtime",
            ));
            return;
        };

        let control = Arc::new(TaskControl::default());
        subscriber.on_subscribe(control.clone());
        let stream = (self.factory)();
        let completion = Completion {
            subscriber,
            control,
            finished: false,
        };
        runtime.spawn(drive(stream, completion));
    }
}

/// Wraps a stream factory into a shared publisher.
///
/// # Example
///
/// ```
/// use braid_core::StreamItem;
/// use braid_exec::{from_stream, IntoStreamExt};
/// use futures::{stream, StreamExt};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let publisher = from_stream(|| stream::iter(vec![1, 2, 3]).map(StreamItem::Value));
/// let items: Vec<u32> = publisher
///     .into_stream(2)
///     .filter_map(|item| async move { item.ok() })
///     .collect()
///     .await;
/// assert_eq!(items, vec![1, 2, 3]);
/// # }
/// ```
pub fn from_stream<T, S, F>(factory: F) -> SharedPublisher<T>
where
    F: Fn() -> S + Send + Sync + 'static,
    S: Stream<Item = StreamItem<T>> + Send + 'static,
    T: Send + 'static,
{
    Arc::new(StreamPublisher::new(factory))
}

#[derive(Default)]
struct TaskControl {
    demand: DemandTracker,
    invalid_request: AtomicBool,
    cancelled: AtomicBool,
    demand_signal: Notify,
    cancel_signal: Notify,
}

impl TaskControl {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    // Resolves to `false` once cancelled or after an invalid request.
    async fn demand_available(&self) -> bool {
        loop {
            if self.is_cancelled() || self.invalid_request.load(Ordering::Acquire) {
                return false;
            }
            if self.demand.has_demand() {
                return true;
            }
            self.demand_signal.notified().await;
        }
    }
}

impl Subscription for TaskControl {
    fn request(&self, n: u64) {
        if self.is_cancelled() {
            return;
        }
        match DemandTracker::validate(n) {
            Ok(n) => {
                self.demand.add(n);
            }
            Err(_) => self.invalid_request.store(true, Ordering::Release),
        }
        self.demand_signal.notify_one();
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.demand_signal.notify_one();
            self.cancel_signal.notify_one();
        }
    }
}

// Fails the subscriber with `BraidError::Cancelled` if the runtime drops the task before
// it reached a terminal signal or a downstream cancel.
struct Completion<T> {
    subscriber: SharedSubscriber<T>,
    control: Arc<TaskControl>,
    finished: bool,
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if !self.finished && !self.control.is_cancelled() {
            warn!("stream publisher task dropped by the runtime");
            self.subscriber.on_error(BraidError::Cancelled);
        }
    }
}

async fn drive<T, S>(stream: S, mut completion: Completion<T>)
where
    S: Stream<Item = StreamItem<T>> + Send + 'static,
    T: Send + 'static,
{
    let control = Arc::clone(&completion.control);
    let subscriber = completion.subscriber.clone();
    let mut stream = Box::pin(stream);
    loop {
        if !control.demand_available().await {
            if control.invalid_request.load(Ordering::Acquire) && !control.is_cancelled() {
                subscriber.on_error(BraidError::invalid_demand(0));
            }
            break;
        }

        let next = tokio::select! {
            next = stream.next() => next,
            () = control.cancel_signal.notified() => break,
        };
        if control.is_cancelled() {
            break;
        }
        match next {
            Some(StreamItem::Value(item)) => {
                control.demand.produced(1);
                subscriber.on_next(item);
            }
            Some(StreamItem::Error(error)) => {
                subscriber.on_error(error);
                break;
            }
            None => {
                subscriber.on_complete();
                break;
            }
        }
    }
    completion.finished = true;
    debug!("stream publisher task finished");
}
