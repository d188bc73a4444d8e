// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::logging::warn;
use crate::subscription::{SharedSubscription, Subscription};
use parking_lot::Mutex;

enum CellState {
    Empty,
    Set(SharedSubscription),
    Cancelled,
}

/// Set-once holder for an upstream subscription that remembers cancellation.
///
/// Cancellation can race with the arrival of the subscription itself; whichever comes
/// second sees the other and the upstream is cancelled exactly once. The lock is only
/// held to read or swap the state, never while calling into the upstream.
pub struct SubscriptionCell {
    state: Mutex<CellState>,
}

impl SubscriptionCell {
    /// Creates an empty, uncancelled cell.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CellState::Empty),
        }
    }

    /// Stores `subscription` if the cell is empty.
    ///
    /// Returns `false` and cancels `subscription` if the cell was already cancelled or
    /// already held a subscription.
    pub fn set(&self, subscription: SharedSubscription) -> bool {
        let mut state = self.state.lock();
        let duplicate = match *state {
            CellState::Empty => {
                *state = CellState::Set(subscription);
                return true;
            }
            CellState::Set(_) => true,
            CellState::Cancelled => false,
        };
        drop(state);
        if duplicate {
            warn!("on_subscribe called twice; cancelling the duplicate subscription");
        }
        subscription.cancel();
        false
    }

    /// Forwards a request to the stored subscription, if any.
    pub fn request(&self, n: u64) {
        let current = match &*self.state.lock() {
            CellState::Set(subscription) => subscription.clone(),
            CellState::Empty | CellState::Cancelled => return,
        };
        current.request(n);
    }

    /// Cancels the stored subscription once. Returns `true` on the first call.
    pub fn cancel(&self) -> bool {
        let previous = std::mem::replace(&mut *self.state.lock(), CellState::Cancelled);
        match previous {
            CellState::Set(subscription) => {
                subscription.cancel();
                true
            }
            CellState::Empty => true,
            CellState::Cancelled => false,
        }
    }

    /// Drops the stored subscription without cancelling it.
    ///
    /// Used after the upstream terminated on its own. The cell behaves as cancelled
    /// afterwards.
    pub fn release(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), CellState::Cancelled);
        drop(previous);
    }

    /// Returns `true` once [`cancel`](Self::cancel) or [`release`](Self::release) has
    /// been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(*self.state.lock(), CellState::Cancelled)
    }
}

impl Default for SubscriptionCell {
    fn default() -> Self {
        Self::new()
    }
}

impl Subscription for SubscriptionCell {
    fn request(&self, n: u64) {
        Self::request(self, n);
    }

    fn cancel(&self) {
        Self::cancel(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Recording {
        requested: AtomicU64,
        cancels: AtomicUsize,
    }

    impl Subscription for Recording {
        fn request(&self, n: u64) {
            self.requested.fetch_add(n, Ordering::SeqCst);
        }

        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn forwards_requests_once_set() {
        let cell = SubscriptionCell::new();
        let upstream = Arc::new(Recording::default());

        cell.request(5);
        assert!(cell.set(upstream.clone()));
        cell.request(3);

        assert_eq!(upstream.requested.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn cancel_before_set_cancels_late_subscription() {
        let cell = SubscriptionCell::new();
        let upstream = Arc::new(Recording::default());

        assert!(cell.cancel());
        assert!(!cell.set(upstream.clone()));

        assert_eq!(upstream.cancels.load(Ordering::SeqCst), 1);
        assert!(cell.is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent() {
        let cell = SubscriptionCell::new();
        let upstream = Arc::new(Recording::default());
        cell.set(upstream.clone());

        assert!(cell.cancel());
        assert!(!cell.cancel());
        cell.request(10);

        assert_eq!(upstream.cancels.load(Ordering::SeqCst), 1);
        assert_eq!(upstream.requested.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn release_drops_without_cancelling() {
        let cell = SubscriptionCell::new();
        let upstream = Arc::new(Recording::default());
        cell.set(upstream.clone());

        cell.release();
        cell.request(1);

        assert_eq!(upstream.cancels.load(Ordering::SeqCst), 0);
        assert_eq!(upstream.requested.load(Ordering::SeqCst), 0);
        assert_eq!(Arc::strong_count(&upstream), 1);
    }

    #[test]
    fn duplicate_subscription_is_cancelled() {
        let cell = SubscriptionCell::new();
        let first = Arc::new(Recording::default());
        let second = Arc::new(Recording::default());

        assert!(cell.set(first.clone()));
        assert!(!cell.set(second.clone()));

        assert_eq!(first.cancels.load(Ordering::SeqCst), 0);
        assert_eq!(second.cancels.load(Ordering::SeqCst), 1);
    }
}
