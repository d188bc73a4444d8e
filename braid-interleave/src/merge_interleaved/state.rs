// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::error_holder::ErrorHolder;
use super::inner_slot::InnerSlot;
use super::outer_subscriber::OuterSubscriber;
use super::slot_ring::SlotRing;
use crate::config::InterleaveConfig;
use crate::logging::debug;
use braid_core::{
    DemandTracker, SharedPublisher, SharedSubscriber, SharedSubscription, Subscription,
    SubscriptionCell,
};
use braid_error::BraidError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

/// Lifecycle of one subscription to the operator. Phases only move forward.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Phase {
    Init = 0,
    SubscribingOuter = 1,
    Active = 2,
    DrainingFinal = 3,
    Terminated = 4,
    Cancelled = 5,
}

impl Phase {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Init,
            1 => Self::SubscribingOuter,
            2 => Self::Active,
            3 => Self::DrainingFinal,
            4 => Self::Terminated,
            _ => Self::Cancelled,
        }
    }

    pub(crate) const fn is_final(self) -> bool {
        matches!(self, Self::Terminated | Self::Cancelled)
    }
}

/// Shared state of one downstream subscription.
///
/// Every downstream signal is issued by whichever thread holds the drainer role. The
/// role is claimed by raising `wip` from zero; any other thread that wants a drain only
/// bumps the counter, and the drainer loops until the counter settles back to zero.
/// Setup starts with the role already held, so sources that emit synchronously while
/// being subscribed are all admitted before the first item goes downstream.
pub(crate) struct MergeState<T> {
    config: InterleaveConfig,
    downstream: SharedSubscriber<T>,
    phase: AtomicU8,
    demand: DemandTracker,
    wip: AtomicUsize,
    outer: SubscriptionCell,
    outer_done: AtomicBool,
    ring: Mutex<SlotRing<T>>,
    admitted: AtomicUsize,
    finished: AtomicUsize,
    unpruned: AtomicUsize,
    next_ordinal: AtomicU64,
    errors: ErrorHolder,
}

impl<T: Send + 'static> MergeState<T> {
    pub(crate) fn new(config: InterleaveConfig, downstream: SharedSubscriber<T>) -> Arc<Self> {
        Arc::new(Self {
            config,
            downstream,
            phase: AtomicU8::new(Phase::Init as u8),
            demand: DemandTracker::new(),
            wip: AtomicUsize::new(1),
            outer: SubscriptionCell::new(),
            outer_done: AtomicBool::new(false),
            ring: Mutex::new(SlotRing::new()),
            admitted: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            unpruned: AtomicUsize::new(0),
            next_ordinal: AtomicU64::new(0),
            errors: ErrorHolder::new(config.delay_errors()),
        })
    }

    /// Hands the subscription downstream, subscribes to the outer source, then releases
    /// the drainer role held since construction.
    pub(crate) fn start(self: &Arc<Self>, sources: &SharedPublisher<SharedPublisher<T>>) {
        let subscription: SharedSubscription = Arc::clone(self) as SharedSubscription;
        self.downstream.on_subscribe(subscription);
        if self.advance(Phase::SubscribingOuter) {
            sources.subscribe(Arc::new(OuterSubscriber::new(Arc::clone(self))));
        }
        self.drain_loop(1);
    }

    pub(crate) fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Moves to `to` if it lies ahead of the current phase. Returns `false` once a final
    /// phase was reached.
    fn advance(&self, to: Phase) -> bool {
        let result = self
            .phase
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let current = Phase::from_u8(current);
                (current < to && !current.is_final()).then_some(to as u8)
            });
        match result {
            Ok(_) => true,
            Err(current) => !Phase::from_u8(current).is_final(),
        }
    }

    /// Moves into the final phase `to`. Returns `true` for the caller that won the race.
    fn finish_with(&self, to: Phase) -> bool {
        self.phase
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (!Phase::from_u8(current).is_final()).then_some(to as u8)
            })
            .is_ok()
    }

    pub(super) fn set_outer(&self, subscription: SharedSubscription) {
        if self.outer.set(subscription) {
            self.outer.request(self.config.initial_outer_request());
        }
    }

    /// Registers a new inner source in rotation and subscribes to it.
    pub(super) fn admit(self: &Arc<Self>, source: SharedPublisher<T>) {
        if self.phase().is_final() {
            return;
        }
        let ordinal = self.next_ordinal.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(InnerSlot::new(
            ordinal,
            self.config.batch_size(),
            Arc::downgrade(self),
        ));
        {
            let mut ring = self.ring.lock();
            if !ring.push(Arc::clone(&slot)) {
                return;
            }
            self.admitted.fetch_add(1, Ordering::AcqRel);
        }
        self.advance(Phase::Active);
        source.subscribe(slot);
    }

    pub(super) fn outer_error(&self, error: BraidError) {
        self.errors.record(error, None);
        self.outer_done.store(true, Ordering::Release);
        self.drain();
    }

    pub(super) fn outer_complete(&self) {
        self.outer_done.store(true, Ordering::Release);
        self.advance(Phase::Active);
        self.drain();
    }

    pub(super) fn inner_error(&self, ordinal: u64, error: BraidError) {
        debug!("merge_interleaved: inner source #{} failed: {}", ordinal, error);
        self.errors.record(error, Some(ordinal));
    }

    /// Counts an inner source that reached a terminal state. Its slot is pruned on the
    /// next drain pass once its buffer is empty.
    pub(super) fn slot_finished(&self) {
        self.finished.fetch_add(1, Ordering::AcqRel);
        self.unpruned.fetch_add(1, Ordering::AcqRel);
    }

    fn all_slots_done(&self) -> bool {
        self.finished.load(Ordering::Acquire) >= self.admitted.load(Ordering::Acquire)
    }

    /// Requests a drain pass, running it on this thread if no other thread is draining.
    pub(super) fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) == 0 {
            self.drain_loop(1);
        }
    }

    fn drain_loop(&self, mut missed: usize) {
        loop {
            self.drain_pass();
            missed = self.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
            if missed == 0 {
                return;
            }
        }
    }

    fn drain_pass(&self) {
        loop {
            match self.phase() {
                Phase::Cancelled => {
                    self.discard_slots();
                    return;
                }
                Phase::Terminated => return,
                _ => {}
            }

            if self.errors.is_failed() {
                if self.flush_failing_slot() {
                    continue;
                }
                let error = self.errors.take_failure();
                self.terminate(error, true);
                return;
            }

            if self.unpruned.swap(0, Ordering::AcqRel) > 0 {
                let freed = self.ring.lock().prune();
                self.backfill(freed);
            }

            if self.outer_done.load(Ordering::Acquire) {
                if self.all_slots_done() {
                    self.advance(Phase::DrainingFinal);
                }
                let empty = self.ring.lock().is_empty();
                if empty {
                    let error = self.errors.take_delayed();
                    self.terminate(error, false);
                    return;
                }
            }

            if !self.demand.has_demand() {
                return;
            }

            let polled = self.ring.lock().poll_next();
            self.backfill(polled.freed);
            match polled.next {
                Some((slot, item)) => {
                    self.emit(item);
                    slot.on_emitted();
                }
                None if polled.freed > 0 => {}
                None => return,
            }
        }
    }

    fn emit(&self, item: T) {
        self.downstream.on_next(item);
        self.demand.produced(1);
    }

    /// Asks the outer source for replacements of finished inner sources.
    fn backfill(&self, freed: usize) {
        if freed == 0
            || self.config.max_concurrency().is_none()
            || self.outer_done.load(Ordering::Acquire)
            || self.phase().is_final()
        {
            return;
        }
        self.outer.request(freed as u64);
    }

    /// Emits one buffered item of the failing inner source while demand lasts.
    /// Returns `false` once the failure should be signaled.
    fn flush_failing_slot(&self) -> bool {
        if !self.config.flush_on_error() {
            return false;
        }
        let Some(origin) = self.errors.failure_origin() else {
            return false;
        };
        let others = self.ring.lock().retain_only(origin);
        self.outer.cancel();
        for slot in others {
            slot.cancel();
        }
        if !self.demand.has_demand() {
            return false;
        }
        let item = self.ring.lock().pop_from(origin);
        match item {
            Some(item) => {
                self.emit(item);
                true
            }
            None => false,
        }
    }

    /// Issues the terminal signal. Upstreams are cancelled when terminating early and
    /// merely released when every source already finished.
    fn terminate(&self, error: Option<BraidError>, cancel_upstream: bool) {
        if !self.finish_with(Phase::Terminated) {
            return;
        }
        let slots = self.ring.lock().close();
        if cancel_upstream {
            self.outer.cancel();
            for slot in slots {
                slot.cancel();
            }
        } else {
            self.outer.release();
            drop(slots);
        }
        match error {
            Some(error) => {
                debug!("merge_interleaved: terminating with error: {}", error);
                self.downstream.on_error(error);
            }
            None => {
                debug!("merge_interleaved: completed");
                self.downstream.on_complete();
            }
        }
    }

    fn discard_slots(&self) {
        let slots = self.ring.lock().close();
        for slot in slots {
            slot.cancel();
        }
    }

    #[cfg(test)]
    pub(super) fn buffered(&self) -> usize {
        self.ring.lock().buffered()
    }

    #[cfg(test)]
    pub(super) fn active_slots(&self) -> usize {
        self.ring.lock().len()
    }
}

impl<T: Send + 'static> Subscription for MergeState<T> {
    fn request(&self, n: u64) {
        if self.phase().is_final() {
            return;
        }
        match DemandTracker::validate(n) {
            Ok(n) => {
                self.demand.add(n);
            }
            Err(error) => self.errors.fail(error, None),
        }
        self.drain();
    }

    fn cancel(&self) {
        if self.finish_with(Phase::Cancelled) {
            debug!("merge_interleaved: cancelled by downstream");
            self.outer.cancel();
            self.drain();
        }
    }
}
