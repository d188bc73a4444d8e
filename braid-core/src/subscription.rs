// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::sync::Arc;

/// Demand and cancellation handle handed to a subscriber.
///
/// - `request` is additive; a request of zero is a protocol violation which the publisher
///   answers with `BraidError::InvalidDemand`.
/// - `cancel` is terminal and idempotent. Requests after cancellation are ignored.
pub trait Subscription: Send + Sync {
    /// Signal demand for `n` more items.
    fn request(&self, n: u64);

    /// Stop the flow of signals and release upstream resources.
    fn cancel(&self);
}

/// A reference-counted, type-erased subscription.
pub type SharedSubscription = Arc<dyn Subscription>;

/// A subscription that has nothing to deliver.
///
/// Handed out by sources that terminate immediately (`empty`, `error`) or never signal
/// at all (`never`).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSubscription;

impl Subscription for NoopSubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {}
}
