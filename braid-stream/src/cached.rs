// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::logging::{debug, warn};
use braid_core::{
    DemandTracker, Publisher, SharedPublisher, SharedSubscriber, SharedSubscription, Subscriber,
    Subscription, SubscriptionCell, UNBOUNDED,
};
use braid_error::BraidError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// A publisher that subscribes to its source once and replays the recording.
///
/// The first subscriber connects the source with unbounded demand. Every signal the
/// source produces is recorded; each subscriber replays the recording from the start at
/// its own pace and then follows the live signals. The upstream is never cancelled by a
/// subscriber, so late subscribers still see the complete history.
///
/// # Example
///
/// ```
/// use braid_core::source;
/// use braid_stream::cached;
/// use braid_test_utils::TestExt;
///
/// let cache = cached(source::range(1, 3));
/// cache.test(u64::MAX).assert_values(&[1, 2, 3]).assert_complete();
/// cache.test(2).assert_values(&[1, 2]).assert_not_terminated();
/// ```
pub struct Cached<T> {
    source: SharedPublisher<T>,
    connected: AtomicBool,
    recording: Arc<Recording<T>>,
}

impl<T: Clone + Send + Sync + 'static> Cached<T> {
    /// Wraps `source` without subscribing to it.
    pub fn new(source: SharedPublisher<T>) -> Self {
        Self {
            source,
            connected: AtomicBool::new(false),
            recording: Arc::new(Recording::default()),
        }
    }

    /// Returns `true` once the source has been subscribed.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl<T: Clone + Send + Sync + 'static> Publisher<T> for Cached<T> {
    fn subscribe(&self, subscriber: SharedSubscriber<T>) {
        let replay = Arc::new(Replay {
            recording: Arc::clone(&self.recording),
            subscriber: Mutex::new(Some(subscriber.clone())),
            position: AtomicUsize::new(0),
            demand: DemandTracker::new(),
            invalid_request: AtomicBool::new(false),
            done: AtomicBool::new(false),
            wip: AtomicUsize::new(0),
        });
        self.recording.listeners.lock().push(Arc::downgrade(&replay));
        subscriber.on_subscribe(replay.clone());

        if !self.connected.swap(true, Ordering::AcqRel) {
            debug!("connecting cached source");
            self.source.subscribe(Arc::new(Recorder {
                recording: Arc::clone(&self.recording),
                upstream: SubscriptionCell::new(),
            }));
        }
        replay.drain();
    }
}

/// Wraps `source` into a shared [`Cached`] publisher.
pub fn cached<T: Clone + Send + Sync + 'static>(source: SharedPublisher<T>) -> SharedPublisher<T> {
    Arc::new(Cached::new(source))
}

#[derive(Clone)]
enum Terminal {
    Complete,
    Error(BraidError),
}

struct Recording<T> {
    history: Mutex<History<T>>,
    listeners: Mutex<Vec<Weak<Replay<T>>>>,
}

impl<T> Default for Recording<T> {
    fn default() -> Self {
        Self {
            history: Mutex::new(History {
                items: Vec::new(),
                terminal: None,
            }),
            listeners: Mutex::new(Vec::new()),
        }
    }
}

struct History<T> {
    items: Vec<T>,
    terminal: Option<Terminal>,
}

impl<T: Clone + Send + Sync + 'static> Recording<T> {
    fn notify(&self) {
        let live: Vec<Arc<Replay<T>>> = {
            let mut listeners = self.listeners.lock();
            listeners.retain(|listener| listener.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for replay in live {
            replay.drain();
        }
    }
}

struct Recorder<T> {
    recording: Arc<Recording<T>>,
    upstream: SubscriptionCell,
}

impl<T: Clone + Send + Sync + 'static> Subscriber<T> for Recorder<T> {
    fn on_subscribe(&self, subscription: SharedSubscription) {
        if self.upstream.set(subscription) {
            self.upstream.request(UNBOUNDED);
        }
    }

    fn on_next(&self, item: T) {
        self.recording.history.lock().items.push(item);
        self.recording.notify();
    }

    fn on_error(&self, error: BraidError) {
        self.upstream.release();
        self.recording.history.lock().terminal = Some(Terminal::Error(error));
        self.recording.notify();
    }

    fn on_complete(&self) {
        self.upstream.release();
        self.recording.history.lock().terminal = Some(Terminal::Complete);
        self.recording.notify();
    }
}

enum Step<T> {
    Item(T),
    Finish(Terminal),
    Wait,
}

struct Replay<T> {
    recording: Arc<Recording<T>>,
    subscriber: Mutex<Option<SharedSubscriber<T>>>,
    position: AtomicUsize,
    demand: DemandTracker,
    invalid_request: AtomicBool,
    done: AtomicBool,
    wip: AtomicUsize,
}

impl<T: Clone + Send + Sync + 'static> Replay<T> {
    fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
        let mut missed = 1;
        loop {
            self.replay_available();
            missed = self.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
            if missed == 0 {
                return;
            }
        }
    }

    fn replay_available(&self) {
        loop {
            if self.done.load(Ordering::Acquire) {
                return;
            }
            if self.invalid_request.load(Ordering::Acquire) {
                self.finish(Terminal::Error(BraidError::invalid_demand(0)));
                return;
            }
            let Some(subscriber) = self.subscriber.lock().clone() else {
                return;
            };
            match self.next_step() {
                Step::Item(item) => {
                    self.position.fetch_add(1, Ordering::AcqRel);
                    self.demand.produced(1);
                    subscriber.on_next(item);
                }
                Step::Finish(terminal) => {
                    self.finish(terminal);
                    return;
                }
                Step::Wait => return,
            }
        }
    }

    fn next_step(&self) -> Step<T> {
        let history = self.recording.history.lock();
        let position = self.position.load(Ordering::Acquire);
        if let Some(item) = history.items.get(position) {
            if self.demand.has_demand() {
                Step::Item(item.clone())
            } else {
                Step::Wait
            }
        } else {
            history
                .terminal
                .clone()
                .map_or(Step::Wait, Step::Finish)
        }
    }

    fn finish(&self, terminal: Terminal) {
        if self.done.swap(true, Ordering::AcqRel) {
            return;
        }
        let subscriber = self.subscriber.lock().take();
        if let Some(subscriber) = subscriber {
            match terminal {
                Terminal::Complete => subscriber.on_complete(),
                Terminal::Error(error) => subscriber.on_error(error),
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Subscription for Replay<T> {
    fn request(&self, n: u64) {
        if self.done.load(Ordering::Acquire) {
            return;
        }
        match DemandTracker::validate(n) {
            Ok(n) => {
                self.demand.add(n);
            }
            Err(_) => {
                warn!("replay received a request for zero items");
                self.invalid_request.store(true, Ordering::Release);
            }
        }
        self.drain();
    }

    fn cancel(&self) {
        self.done.store(true, Ordering::Release);
        self.subscriber.lock().take();
    }
}
