// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::subscription::SharedSubscription;
use braid_error::BraidError;
use std::sync::Arc;

/// The receiving end of a subscription.
///
/// Signals may be issued from any thread, but a well-behaved publisher never issues two
/// signals to the same subscriber concurrently.
pub trait Subscriber<T>: Send + Sync {
    /// Receives the handle used to request items and to cancel.
    fn on_subscribe(&self, subscription: SharedSubscription);

    /// Receives one requested item.
    fn on_next(&self, item: T);

    /// Receives the terminal error. No further signals follow.
    fn on_error(&self, error: BraidError);

    /// Receives the terminal completion. No further signals follow.
    fn on_complete(&self);
}

/// A reference-counted, type-erased subscriber.
pub type SharedSubscriber<T> = Arc<dyn Subscriber<T>>;
