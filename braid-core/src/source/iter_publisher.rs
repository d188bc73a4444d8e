// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::demand_tracker::DemandTracker;
use crate::publisher::Publisher;
use crate::subscriber::SharedSubscriber;
use crate::subscription::Subscription;
use braid_error::BraidError;
use parking_lot::Mutex;
use std::iter::Peekable;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cold publisher that replays a cloneable iterable to every subscriber.
///
/// Completion is signaled as soon as the last item has been emitted, without waiting
/// for further demand.
#[derive(Debug, Clone)]
pub struct IterPublisher<I> {
    items: I,
}

impl<I> IterPublisher<I> {
    /// Creates a publisher over `items`.
    pub const fn new(items: I) -> Self {
        Self { items }
    }
}

impl<I> Publisher<I::Item> for IterPublisher<I>
where
    I: IntoIterator + Clone + Send + Sync + 'static,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    fn subscribe(&self, subscriber: SharedSubscriber<I::Item>) {
        let subscription = Arc::new(IterSubscription {
            iter: Mutex::new(self.items.clone().into_iter().peekable()),
            demand: DemandTracker::new(),
            invalid_request: AtomicBool::new(false),
            done: AtomicBool::new(false),
            subscriber: subscriber.clone(),
        });
        subscriber.on_subscribe(subscription.clone());
        subscription.start_if_empty();
    }
}

struct IterSubscription<It: Iterator> {
    iter: Mutex<Peekable<It>>,
    demand: DemandTracker,
    invalid_request: AtomicBool,
    done: AtomicBool,
    subscriber: SharedSubscriber<It::Item>,
}

impl<It> IterSubscription<It>
where
    It: Iterator + Send,
    It::Item: Send,
{
    // An empty iterable completes without any demand.
    fn start_if_empty(&self) {
        let empty = self.iter.lock().peek().is_none();
        if empty && self.demand.add(1) == 0 {
            self.emit_loop();
        }
    }

    fn finish(&self) -> bool {
        !self.done.swap(true, Ordering::AcqRel)
    }

    // Runs only on the caller that raised demand from zero; reentrant requests issued
    // from inside `on_next` just add to the demand this loop is already serving.
    fn emit_loop(&self) {
        let mut emitted = 0u64;
        let mut requested = self.demand.get();
        loop {
            while emitted != requested {
                if self.done.load(Ordering::Acquire) {
                    return;
                }
                if self.invalid_request.load(Ordering::Acquire) {
                    if self.finish() {
                        self.subscriber.on_error(BraidError::invalid_demand(0));
                    }
                    return;
                }

                let next = self.iter.lock().next();
                let Some(item) = next else {
                    if self.finish() {
                        self.subscriber.on_complete();
                    }
                    return;
                };
                self.subscriber.on_next(item);
                emitted += 1;

                let exhausted = self.iter.lock().peek().is_none();
                if exhausted {
                    if self.finish() {
                        self.subscriber.on_complete();
                    }
                    return;
                }
            }

            requested = self.demand.get();
            if requested == emitted {
                requested = self.demand.produced(emitted);
                if requested == 0 {
                    return;
                }
                emitted = 0;
            }
        }
    }
}

impl<It> Subscription for IterSubscription<It>
where
    It: Iterator + Send,
    It::Item: Send,
{
    fn request(&self, n: u64) {
        if self.done.load(Ordering::Acquire) {
            return;
        }
        let n = if DemandTracker::validate(n).is_err() {
            self.invalid_request.store(true, Ordering::Release);
            1
        } else {
            n
        };
        if self.demand.add(n) == 0 {
            self.emit_loop();
        }
    }

    fn cancel(&self) {
        self.done.store(true, Ordering::Release);
    }
}
