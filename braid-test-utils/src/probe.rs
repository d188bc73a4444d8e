// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Transparent publisher wrapper that counts traffic across the subscription boundary.

use braid_core::{
    Publisher, SharedPublisher, SharedSubscriber, SharedSubscription, Subscriber, Subscription,
};
use braid_error::BraidError;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counters shared by every subscription made through a probed publisher.
#[derive(Debug, Default)]
pub struct ProbeStats {
    requested: AtomicU64,
    delivered: AtomicU64,
    cancels: AtomicUsize,
    subscriptions: AtomicUsize,
    terminations: AtomicUsize,
}

impl ProbeStats {
    /// Total demand requested, saturating at `u64::MAX`.
    pub fn requested(&self) -> u64 {
        self.requested.load(Ordering::Acquire)
    }

    /// Items delivered by the source.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Acquire)
    }

    /// Requested but not yet delivered.
    pub fn outstanding(&self) -> u64 {
        self.requested().saturating_sub(self.delivered())
    }

    /// Number of `cancel` calls that reached the source.
    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::Acquire)
    }

    /// Number of subscriptions made.
    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::Acquire)
    }

    /// Number of terminal signals emitted by the source.
    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::Acquire)
    }
}

struct ProbePublisher<T> {
    source: SharedPublisher<T>,
    stats: Arc<ProbeStats>,
}

struct ProbeSubscriber<T> {
    downstream: SharedSubscriber<T>,
    stats: Arc<ProbeStats>,
}

struct ProbeSubscription {
    upstream: SharedSubscription,
    stats: Arc<ProbeStats>,
}

/// Wraps `source` so that requests, deliveries and cancellations are counted.
///
/// # Example
///
/// ```
/// use braid_core::source;
/// use braid_test_utils::{probe, TestExt};
///
/// let (probed, stats) = probe(source::range(0, 10));
/// let ts = probed.test(4);
///
/// ts.assert_value_count(4);
/// assert_eq!(stats.requested(), 4);
/// assert_eq!(stats.delivered(), 4);
/// ```
pub fn probe<T: Send + 'static>(source: SharedPublisher<T>) -> (SharedPublisher<T>, Arc<ProbeStats>) {
    let stats = Arc::new(ProbeStats::default());
    let probed = Arc::new(ProbePublisher {
        source,
        stats: Arc::clone(&stats),
    });
    (probed, stats)
}

impl<T: Send + 'static> Publisher<T> for ProbePublisher<T> {
    fn subscribe(&self, subscriber: SharedSubscriber<T>) {
        self.stats.subscriptions.fetch_add(1, Ordering::AcqRel);
        self.source.subscribe(Arc::new(ProbeSubscriber {
            downstream: subscriber,
            stats: Arc::clone(&self.stats),
        }));
    }
}

impl<T: Send + 'static> Subscriber<T> for ProbeSubscriber<T> {
    fn on_subscribe(&self, subscription: SharedSubscription) {
        self.downstream.on_subscribe(Arc::new(ProbeSubscription {
            upstream: subscription,
            stats: Arc::clone(&self.stats),
        }));
    }

    fn on_next(&self, item: T) {
        self.stats.delivered.fetch_add(1, Ordering::AcqRel);
        self.downstream.on_next(item);
    }

    fn on_error(&self, error: BraidError) {
        self.stats.terminations.fetch_add(1, Ordering::AcqRel);
        self.downstream.on_error(error);
    }

    fn on_complete(&self) {
        self.stats.terminations.fetch_add(1, Ordering::AcqRel);
        self.downstream.on_complete();
    }
}

impl Subscription for ProbeSubscription {
    fn request(&self, n: u64) {
        let _ = self
            .stats
            .requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(n))
            });
        self.upstream.request(n);
    }

    fn cancel(&self) {
        self.stats.cancels.fetch_add(1, Ordering::AcqRel);
        self.upstream.cancel();
    }
}
