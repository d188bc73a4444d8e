// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Lock-free bookkeeping for outstanding downstream demand.

use braid_error::{BraidError, Result};
use std::sync::atomic::{AtomicU64, Ordering};

/// Demand value meaning "no limit"; once reached it is never decremented.
pub const UNBOUNDED: u64 = u64::MAX;

/// Atomic counter of items requested but not yet delivered.
///
/// Additions saturate at [`UNBOUNDED`]. Subtractions never go below zero and leave an
/// unbounded counter untouched.
///
/// # Example
///
/// ```
/// use braid_core::{DemandTracker, UNBOUNDED};
///
/// let demand = DemandTracker::new();
/// assert_eq!(demand.add(3), 0);
/// assert_eq!(demand.produced(2), 1);
///
/// demand.add(UNBOUNDED);
/// assert_eq!(demand.produced(1_000), UNBOUNDED);
/// ```
#[derive(Debug, Default)]
pub struct DemandTracker {
    requested: AtomicU64,
}

impl DemandTracker {
    /// Creates a tracker with zero outstanding demand.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requested: AtomicU64::new(0),
        }
    }

    /// Rejects a request of zero items.
    ///
    /// # Errors
    ///
    /// Returns `BraidError::InvalidDemand` when `n` is zero.
    pub const fn validate(n: u64) -> Result<u64> {
        if n == 0 {
            Err(BraidError::invalid_demand(n))
        } else {
            Ok(n)
        }
    }

    /// Adds `n` to the outstanding demand and returns the value before the addition.
    ///
    /// A caller that observes a previous value of zero is the one responsible for
    /// starting emission.
    pub fn add(&self, n: u64) -> u64 {
        let mut current = self.requested.load(Ordering::Acquire);
        loop {
            if current == UNBOUNDED {
                return UNBOUNDED;
            }
            let next = current.saturating_add(n);
            match self.requested.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(previous) => return previous,
                Err(actual) => current = actual,
            }
        }
    }

    /// Records that `n` items were delivered and returns the remaining demand.
    pub fn produced(&self, n: u64) -> u64 {
        let mut current = self.requested.load(Ordering::Acquire);
        loop {
            if current == UNBOUNDED {
                return UNBOUNDED;
            }
            let next = current.saturating_sub(n);
            match self.requested.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Returns the current outstanding demand.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.requested.load(Ordering::Acquire)
    }

    /// Returns `true` if at least one more item may be delivered.
    #[must_use]
    pub fn has_demand(&self) -> bool {
        self.get() > 0
    }

    /// Returns `true` once the demand has become unbounded.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.get() == UNBOUNDED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn add_saturates_to_unbounded() {
        let demand = DemandTracker::new();
        demand.add(UNBOUNDED - 1);
        assert_eq!(demand.add(10), UNBOUNDED - 1);
        assert!(demand.is_unbounded());
        assert_eq!(demand.add(1), UNBOUNDED);
    }

    #[test]
    fn produced_never_goes_negative() {
        let demand = DemandTracker::new();
        demand.add(2);
        assert_eq!(demand.produced(5), 0);
        assert!(!demand.has_demand());
    }

    #[test]
    fn validate_rejects_zero() {
        assert!(DemandTracker::validate(0).is_err());
        assert_eq!(DemandTracker::validate(7).ok(), Some(7));
    }

    #[test]
    fn concurrent_adds_are_not_lost() {
        let demand = Arc::new(DemandTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let demand = Arc::clone(&demand);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        demand.add(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(demand.get(), 8_000);
    }
}
