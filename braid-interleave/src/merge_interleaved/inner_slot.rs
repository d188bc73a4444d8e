// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::state::MergeState;
use crate::logging::warn;
use braid_core::{SharedSubscription, Subscriber, SubscriptionCell};
use braid_error::BraidError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Weak;

/// Per-inner-source bookkeeping and the subscriber handed to that source.
///
/// The buffer holds at most `batch_size` items: the slot never has more than one batch
/// outstanding and asks for the next batch only after the previous one was fully
/// emitted downstream.
pub(super) struct InnerSlot<T> {
    ordinal: u64,
    batch_size: usize,
    parent: Weak<MergeState<T>>,
    subscription: SubscriptionCell,
    queue: Mutex<VecDeque<T>>,
    done: AtomicBool,
    consumed: AtomicUsize,
}

impl<T: Send + 'static> InnerSlot<T> {
    pub(super) fn new(ordinal: u64, batch_size: usize, parent: Weak<MergeState<T>>) -> Self {
        Self {
            ordinal,
            batch_size,
            parent,
            subscription: SubscriptionCell::new(),
            queue: Mutex::new(VecDeque::new()),
            done: AtomicBool::new(false),
            consumed: AtomicUsize::new(0),
        }
    }

    pub(super) fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// The source has terminated; buffered items may remain.
    pub(super) fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub(super) fn pop(&self) -> Option<T> {
        self.queue.lock().pop_front()
    }

    pub(super) fn buffered(&self) -> usize {
        self.queue.lock().len()
    }

    /// Called by the drainer after one of this slot's items went downstream.
    pub(super) fn on_emitted(&self) {
        let consumed = self.consumed.load(Ordering::Relaxed) + 1;
        if consumed < self.batch_size {
            self.consumed.store(consumed, Ordering::Relaxed);
            return;
        }
        self.consumed.store(0, Ordering::Relaxed);
        if !self.is_done() {
            self.subscription.request(self.batch_size as u64);
        }
    }

    /// Cancels the source and discards whatever it buffered.
    pub(super) fn cancel(&self) {
        self.finish();
        self.subscription.cancel();
        self.queue.lock().clear();
    }

    fn signal_parent(&self) {
        if let Some(parent) = self.parent.upgrade() {
            parent.drain();
        }
    }

    /// Marks the source terminated and tells the parent. Returns `false` if it already was.
    fn finish(&self) -> bool {
        if self.done.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(parent) = self.parent.upgrade() {
            parent.slot_finished();
        }
        true
    }

    fn fail(&self, error: BraidError) {
        if self.is_done() {
            return;
        }
        self.subscription.release();
        // The error must be visible before the slot can be pruned as finished.
        if let Some(parent) = self.parent.upgrade() {
            parent.inner_error(self.ordinal, error);
        }
        if self.finish() {
            self.signal_parent();
        }
    }
}

impl<T: Send + 'static> Subscriber<T> for InnerSlot<T> {
    fn on_subscribe(&self, subscription: SharedSubscription) {
        if self.subscription.set(subscription) {
            self.subscription.request(self.batch_size as u64);
        }
    }

    fn on_next(&self, item: T) {
        if self.is_done() {
            return;
        }
        let overflow = {
            let mut queue = self.queue.lock();
            if queue.len() >= self.batch_size {
                true
            } else {
                queue.push_back(item);
                false
            }
        };
        if overflow {
            warn!(
                "merge_interleaved: inner source #{} emitted beyond its demand",
                self.ordinal
            );
            self.subscription.cancel();
            self.fail(BraidError::missing_backpressure(
                format!("inner source #{}", self.ordinal),
                self.batch_size,
            ));
            return;
        }
        self.signal_parent();
    }

    fn on_error(&self, error: BraidError) {
        self.fail(error);
    }

    fn on_complete(&self) {
        if self.finish() {
            self.subscription.release();
            self.signal_parent();
        }
    }
}
