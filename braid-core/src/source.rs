// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Cold, demand-driven sources.
//!
//! Every source honors backpressure, completes or fails at most once, and tolerates
//! subscribers that request more items from inside `on_next` without growing the stack.
//!
//! ```
//! use braid_core::source;
//!
//! let numbers = source::range(1, 5);
//! let ones = source::repeat(1u8);
//! let nothing = source::empty::<u8>();
//! # let _ = (numbers, ones, nothing);
//! ```

mod iter_publisher;
mod signal_publisher;

pub use iter_publisher::IterPublisher;
pub use signal_publisher::{SignalPublisher, Terminal};

use crate::publisher::SharedPublisher;
use braid_error::BraidError;
use std::sync::Arc;

/// Emits the items of `items`, starting over for each subscriber.
pub fn from_iter<I>(items: I) -> SharedPublisher<I::Item>
where
    I: IntoIterator + Clone + Send + Sync + 'static,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    Arc::new(IterPublisher::new(items))
}

/// Emits `item` once and completes.
pub fn just<T>(item: T) -> SharedPublisher<T>
where
    T: Clone + Send + Sync + 'static,
{
    from_iter(std::iter::once(item))
}

/// Emits `item` forever.
pub fn repeat<T>(item: T) -> SharedPublisher<T>
where
    T: Clone + Send + Sync + 'static,
{
    from_iter(std::iter::repeat(item))
}

/// Emits `item` `times` times and completes.
pub fn repeat_n<T>(item: T, times: usize) -> SharedPublisher<T>
where
    T: Clone + Send + Sync + 'static,
{
    from_iter(std::iter::repeat(item).take(times))
}

/// Emits `count` consecutive integers starting at `start`.
#[must_use]
pub fn range(start: u32, count: u32) -> SharedPublisher<u32> {
    from_iter(start..start.saturating_add(count))
}

/// Completes immediately without emitting.
#[must_use]
pub fn empty<T: Send + 'static>() -> SharedPublisher<T> {
    Arc::new(SignalPublisher::new(Terminal::Complete))
}

/// Fails immediately with `error`.
#[must_use]
pub fn error<T: Send + 'static>(error: BraidError) -> SharedPublisher<T> {
    Arc::new(SignalPublisher::new(Terminal::Error(error)))
}

/// Never emits and never terminates.
#[must_use]
pub fn never<T: Send + 'static>() -> SharedPublisher<T> {
    Arc::new(SignalPublisher::new(Terminal::Never))
}
