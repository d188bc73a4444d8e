// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::subscriber::SharedSubscriber;
use std::sync::Arc;

/// A source of items that pushes them to subscribers on demand.
///
/// Every call to [`subscribe`](Publisher::subscribe) starts an independent subscription:
/// the publisher must call `on_subscribe` on the subscriber exactly once before any other
/// signal, deliver no more `on_next` signals than were requested, and finish with at most
/// one of `on_complete` or `on_error`.
///
/// Publishers are shared as [`SharedPublisher`] so that a stream of streams can hold its
/// inner sources as plain values.
///
/// # Example
///
/// ```
/// use braid_core::{source, Publisher, SharedPublisher};
///
/// let numbers: SharedPublisher<u32> = source::range(1, 3);
/// let nested: SharedPublisher<SharedPublisher<u32>> = source::just(numbers);
/// # let _ = nested;
/// ```
pub trait Publisher<T>: Send + Sync {
    /// Attach `subscriber` to a new subscription of this publisher.
    fn subscribe(&self, subscriber: SharedSubscriber<T>);
}

/// A reference-counted, type-erased publisher.
pub type SharedPublisher<T> = Arc<dyn Publisher<T>>;
