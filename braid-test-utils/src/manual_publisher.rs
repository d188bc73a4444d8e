// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::{Publisher, SharedPublisher, SharedSubscriber, Subscription};
use braid_error::BraidError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

struct ManualState<T> {
    subscriber: Mutex<Option<SharedSubscriber<T>>>,
    requested: AtomicU64,
    cancelled: AtomicBool,
    subscriptions: AtomicUsize,
}

/// A source driven by the test itself.
///
/// Signals are pushed from the calling thread with [`emit`](Self::emit),
/// [`complete`](Self::complete) and [`fail`](Self::fail). Requests and cancellation coming
/// from downstream are recorded but not enforced, so a test can also provoke protocol
/// violations. Only the most recent subscriber receives signals.
pub struct ManualPublisher<T> {
    state: Arc<ManualState<T>>,
}

impl<T: Send + 'static> ManualPublisher<T> {
    /// Creates a publisher with no subscriber.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(ManualState {
                subscriber: Mutex::new(None),
                requested: AtomicU64::new(0),
                cancelled: AtomicBool::new(false),
                subscriptions: AtomicUsize::new(0),
            }),
        })
    }

    /// Returns this publisher as a [`SharedPublisher`].
    pub fn shared(self: &Arc<Self>) -> SharedPublisher<T> {
        self.clone()
    }

    fn subscriber(&self) -> Option<SharedSubscriber<T>> {
        self.state.subscriber.lock().clone()
    }

    /// Delivers `item` to the current subscriber, ignoring demand.
    pub fn emit(&self, item: T) {
        if let Some(subscriber) = self.subscriber() {
            subscriber.on_next(item);
        }
    }

    /// Completes the current subscriber.
    pub fn complete(&self) {
        let subscriber = self.state.subscriber.lock().take();
        if let Some(subscriber) = subscriber {
            subscriber.on_complete();
        }
    }

    /// Fails the current subscriber with `error`.
    pub fn fail(&self, error: BraidError) {
        let subscriber = self.state.subscriber.lock().take();
        if let Some(subscriber) = subscriber {
            subscriber.on_error(error);
        }
    }

    /// Total demand requested so far, saturating at `u64::MAX`.
    pub fn requested(&self) -> u64 {
        self.state.requested.load(Ordering::Acquire)
    }

    /// Returns `true` once the subscriber cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Returns `true` while a subscriber is attached and not terminated.
    pub fn has_subscriber(&self) -> bool {
        self.state.subscriber.lock().is_some()
    }

    /// Number of subscriptions made so far.
    pub fn subscription_count(&self) -> usize {
        self.state.subscriptions.load(Ordering::Acquire)
    }
}

impl<T: Send + 'static> Publisher<T> for ManualPublisher<T> {
    fn subscribe(&self, subscriber: SharedSubscriber<T>) {
        self.state.subscriptions.fetch_add(1, Ordering::AcqRel);
        *self.state.subscriber.lock() = Some(subscriber.clone());
        subscriber.on_subscribe(Arc::new(ManualSubscription {
            state: Arc::clone(&self.state),
        }));
    }
}

struct ManualSubscription<T> {
    state: Arc<ManualState<T>>,
}

impl<T: Send + 'static> Subscription for ManualSubscription<T> {
    fn request(&self, n: u64) {
        let _ = self
            .state
            .requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(n))
            });
    }

    fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
        self.state.subscriber.lock().take();
    }
}
