// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::merge_interleaved::{merge_interleaved, MergeInterleavedBuilder};
use braid_core::{
    Publisher, SharedPublisher, SharedSubscriber, SharedSubscription, Subscriber,
};
use braid_error::{BraidError, Result};
use std::marker::PhantomData;
use std::sync::Arc;

/// Maps every item of `source` to an inner publisher and merges those round-robin.
///
/// Equivalent to mapping first and passing the result to
/// [`merge_interleaved`](crate::merge_interleaved()) with the given `max_concurrency`
/// and the default batch size. The mapper runs on whatever thread `source` emits on.
///
/// # Errors
///
/// Returns `BraidError::InvalidConfiguration` if `max_concurrency` is zero.
///
/// # Example
///
/// ```
/// use braid_core::source;
/// use braid_interleave::flat_map_interleaved;
/// use braid_test_utils::TestExt;
///
/// let merged = flat_map_interleaved(source::range(1, 3), |n| source::repeat_n(n, 2), 3)?;
///
/// merged
///     .test(u64::MAX)
///     .assert_values(&[1, 2, 3, 1, 2, 3])
///     .assert_complete();
/// # Ok::<(), braid_error::BraidError>(())
/// ```
pub fn flat_map_interleaved<T, R, F>(
    source: SharedPublisher<T>,
    mapper: F,
    max_concurrency: usize,
) -> Result<SharedPublisher<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> SharedPublisher<R> + Send + Sync + 'static,
{
    flat_map_interleaved_builder(source, mapper)
        .max_concurrency(max_concurrency)
        .build()
}

/// Like [`flat_map_interleaved`], returning the merge builder for further configuration.
pub fn flat_map_interleaved_builder<T, R, F>(
    source: SharedPublisher<T>,
    mapper: F,
) -> MergeInterleavedBuilder<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> SharedPublisher<R> + Send + Sync + 'static,
{
    let mapped: SharedPublisher<SharedPublisher<R>> = Arc::new(MapPublisher {
        source,
        mapper: Arc::new(mapper),
        _marker: PhantomData,
    });
    merge_interleaved(mapped)
}

/// Method-call syntax for [`flat_map_interleaved`].
pub trait FlatMapInterleavedExt<T> {
    /// Maps every item to an inner publisher and merges those round-robin.
    ///
    /// # Errors
    ///
    /// Returns `BraidError::InvalidConfiguration` if `max_concurrency` is zero.
    fn flat_map_interleaved<R, F>(self, mapper: F, max_concurrency: usize) -> Result<SharedPublisher<R>>
    where
        R: Send + 'static,
        F: Fn(T) -> SharedPublisher<R> + Send + Sync + 'static;
}

impl<T: Send + 'static> FlatMapInterleavedExt<T> for SharedPublisher<T> {
    fn flat_map_interleaved<R, F>(self, mapper: F, max_concurrency: usize) -> Result<SharedPublisher<R>>
    where
        R: Send + 'static,
        F: Fn(T) -> SharedPublisher<R> + Send + Sync + 'static,
    {
        flat_map_interleaved(self, mapper, max_concurrency)
    }
}

struct MapPublisher<T, R, F> {
    source: SharedPublisher<T>,
    mapper: Arc<F>,
    _marker: PhantomData<fn() -> R>,
}

impl<T, R, F> Publisher<SharedPublisher<R>> for MapPublisher<T, R, F>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> SharedPublisher<R> + Send + Sync + 'static,
{
    fn subscribe(&self, subscriber: SharedSubscriber<SharedPublisher<R>>) {
        self.source.subscribe(Arc::new(MapSubscriber {
            downstream: subscriber,
            mapper: Arc::clone(&self.mapper),
        }));
    }
}

struct MapSubscriber<R, F> {
    downstream: SharedSubscriber<SharedPublisher<R>>,
    mapper: Arc<F>,
}

impl<T, R, F> Subscriber<T> for MapSubscriber<R, F>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> SharedPublisher<R> + Send + Sync + 'static,
{
    fn on_subscribe(&self, subscription: SharedSubscription) {
        self.downstream.on_subscribe(subscription);
    }

    fn on_next(&self, item: T) {
        self.downstream.on_next((self.mapper)(item));
    }

    fn on_error(&self, error: BraidError) {
        self.downstream.on_error(error);
    }

    fn on_complete(&self) {
        self.downstream.on_complete();
    }
}
