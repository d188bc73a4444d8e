// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A recording subscriber with fluent assertions.

use braid_core::{Publisher, SharedSubscription, Subscriber};
use braid_error::BraidError;
use parking_lot::{Condvar, Mutex};
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Recorded<T> {
    values: Vec<T>,
    errors: Vec<BraidError>,
    completions: usize,
}

/// Subscriber that records every signal for later inspection.
///
/// Requests `initial_request` items from inside `on_subscribe` (nothing when zero);
/// more can be requested with [`request_more`](Self::request_more). Signals that
/// overlap in time are counted, which makes serialization violations observable.
///
/// # Example
///
/// ```
/// use braid_core::source;
/// use braid_test_utils::TestExt;
///
/// let ts = source::range(1, 5).test(3);
/// ts.assert_values(&[1, 2, 3]).assert_not_terminated();
/// ts.request_more(10);
/// ts.assert_values(&[1, 2, 3, 4, 5]).assert_complete();
/// ```
pub struct TestSubscriber<T> {
    initial_request: u64,
    subscription: Mutex<Option<SharedSubscription>>,
    cancelled: AtomicBool,
    recorded: Mutex<Recorded<T>>,
    changed: Condvar,
    in_signal: AtomicBool,
    overlaps: AtomicUsize,
    subscribe_calls: AtomicUsize,
}

impl<T> TestSubscriber<T> {
    /// Creates a subscriber that requests `initial_request` items on subscription.
    #[must_use]
    pub fn new(initial_request: u64) -> Arc<Self> {
        Arc::new(Self {
            initial_request,
            subscription: Mutex::new(None),
            cancelled: AtomicBool::new(false),
            recorded: Mutex::new(Recorded {
                values: Vec::new(),
                errors: Vec::new(),
                completions: 0,
            }),
            changed: Condvar::new(),
            in_signal: AtomicBool::new(false),
            overlaps: AtomicUsize::new(0),
            subscribe_calls: AtomicUsize::new(0),
        })
    }

    /// Creates a subscriber with unbounded initial demand.
    #[must_use]
    pub fn unbounded() -> Arc<Self> {
        Self::new(u64::MAX)
    }

    fn current_subscription(&self) -> Option<SharedSubscription> {
        self.subscription.lock().clone()
    }

    /// Requests `n` more items from the upstream.
    pub fn request_more(&self, n: u64) {
        if let Some(subscription) = self.current_subscription() {
            subscription.request(n);
        }
    }

    /// Cancels the upstream subscription.
    ///
    /// The subscription is kept, so later [`request_more`](Self::request_more) calls
    /// still reach the upstream.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(subscription) = self.current_subscription() {
            subscription.cancel();
        }
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns the number of received items.
    pub fn value_count(&self) -> usize {
        self.recorded.lock().values.len()
    }

    /// Returns the received errors.
    pub fn errors(&self) -> Vec<BraidError> {
        self.recorded.lock().errors.clone()
    }

    /// Returns the number of `on_complete` signals.
    pub fn completions(&self) -> usize {
        self.recorded.lock().completions
    }

    /// Returns `true` after a terminal signal.
    pub fn is_terminated(&self) -> bool {
        let recorded = self.recorded.lock();
        recorded.completions > 0 || !recorded.errors.is_empty()
    }

    /// Returns how many times two signals were observed in flight at once.
    pub fn overlapping_signals(&self) -> usize {
        self.overlaps.load(Ordering::Acquire)
    }

    /// Blocks until a terminal signal arrives or `timeout` elapses.
    pub fn await_done(&self, timeout: Duration) -> bool {
        self.await_until(timeout, |recorded| {
            recorded.completions > 0 || !recorded.errors.is_empty()
        })
    }

    /// Blocks until at least `count` items arrived, the stream terminated, or
    /// `timeout` elapsed. Returns `true` if `count` items arrived.
    pub fn await_count(&self, count: usize, timeout: Duration) -> bool {
        self.await_until(timeout, |recorded| {
            recorded.values.len() >= count
                || recorded.completions > 0
                || !recorded.errors.is_empty()
        });
        self.value_count() >= count
    }

    fn await_until(&self, timeout: Duration, done: impl Fn(&Recorded<T>) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        let mut recorded = self.recorded.lock();
        while !done(&recorded) {
            if self.changed.wait_until(&mut recorded, deadline).timed_out() {
                return done(&recorded);
            }
        }
        true
    }

    fn enter(&self) {
        if self.in_signal.swap(true, Ordering::AcqRel) {
            self.overlaps.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn exit(&self) {
        self.in_signal.store(false, Ordering::Release);
        self.changed.notify_all();
    }

    /// Asserts exactly `count` items were received.
    #[track_caller]
    pub fn assert_value_count(&self, count: usize) -> &Self {
        assert_eq!(self.value_count(), count, "unexpected number of values");
        self
    }

    /// Asserts no items were received.
    #[track_caller]
    pub fn assert_no_values(&self) -> &Self {
        self.assert_value_count(0)
    }

    /// Asserts exactly one completion and no error.
    #[track_caller]
    pub fn assert_complete(&self) -> &Self {
        let recorded = self.recorded.lock();
        assert_eq!(recorded.completions, 1, "expected exactly one completion");
        assert!(
            recorded.errors.is_empty(),
            "expected no error, got {:?}",
            recorded.errors
        );
        drop(recorded);
        self
    }

    /// Asserts neither completion nor error was received.
    #[track_caller]
    pub fn assert_not_terminated(&self) -> &Self {
        let recorded = self.recorded.lock();
        assert_eq!(recorded.completions, 0, "unexpected completion");
        assert!(
            recorded.errors.is_empty(),
            "unexpected error: {:?}",
            recorded.errors
        );
        drop(recorded);
        self
    }

    /// Asserts exactly one error, no completion, and that the error satisfies `check`.
    #[track_caller]
    pub fn assert_error(&self, check: impl FnOnce(&BraidError) -> bool) -> &Self {
        let recorded = self.recorded.lock();
        assert_eq!(recorded.completions, 0, "unexpected completion");
        assert_eq!(recorded.errors.len(), 1, "expected exactly one error");
        assert!(
            check(&recorded.errors[0]),
            "error did not match: {:?}",
            recorded.errors[0]
        );
        drop(recorded);
        self
    }

    /// Asserts exactly one error whose message equals `message`.
    #[track_caller]
    pub fn assert_error_message(&self, message: &str) -> &Self {
        self.assert_error(|error| error.to_string() == message)
    }

    /// Asserts no two signals were ever delivered concurrently.
    #[track_caller]
    pub fn assert_serialized(&self) -> &Self {
        assert_eq!(self.overlapping_signals(), 0, "signals overlapped");
        self
    }

    /// Asserts `on_subscribe` was called exactly once.
    #[track_caller]
    pub fn assert_subscribed(&self) -> &Self {
        assert_eq!(
            self.subscribe_calls.load(Ordering::Acquire),
            1,
            "expected exactly one on_subscribe"
        );
        self
    }
}

impl<T: Clone> TestSubscriber<T> {
    /// Returns a copy of the received items.
    pub fn values(&self) -> Vec<T> {
        self.recorded.lock().values.clone()
    }
}

impl<T: Clone + PartialEq + Debug> TestSubscriber<T> {
    /// Asserts the received items equal `expected`, in order.
    #[track_caller]
    pub fn assert_values(&self, expected: &[T]) -> &Self {
        assert_eq!(self.values(), expected);
        self
    }
}

impl<T: Send> Subscriber<T> for TestSubscriber<T> {
    fn on_subscribe(&self, subscription: SharedSubscription) {
        self.subscribe_calls.fetch_add(1, Ordering::AcqRel);
        if self.is_cancelled() {
            subscription.cancel();
            return;
        }
        *self.subscription.lock() = Some(subscription.clone());
        if self.initial_request > 0 {
            subscription.request(self.initial_request);
        }
    }

    fn on_next(&self, item: T) {
        self.enter();
        self.recorded.lock().values.push(item);
        self.exit();
    }

    fn on_error(&self, error: BraidError) {
        self.enter();
        self.subscription.lock().take();
        self.recorded.lock().errors.push(error);
        self.exit();
    }

    fn on_complete(&self) {
        self.enter();
        self.subscription.lock().take();
        self.recorded.lock().completions += 1;
        self.exit();
    }
}

/// Subscribes a fresh [`TestSubscriber`] to a publisher.
pub trait TestExt<T> {
    /// Subscribes with the given initial request and returns the recording subscriber.
    fn test(&self, initial_request: u64) -> Arc<TestSubscriber<T>>;
}

impl<T, P> TestExt<T> for P
where
    T: Send + 'static,
    P: Publisher<T> + ?Sized,
{
    fn test(&self, initial_request: u64) -> Arc<TestSubscriber<T>> {
        let subscriber = TestSubscriber::new(initial_request);
        self.subscribe(subscriber.clone());
        subscriber
    }
}
