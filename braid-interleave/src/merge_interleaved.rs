// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod error_holder;
mod inner_slot;
mod outer_subscriber;
mod slot_ring;
mod state;

use crate::config::{InterleaveConfig, DEFAULT_BATCH_SIZE};
use braid_core::{Publisher, SharedPublisher, SharedSubscriber};
use braid_error::Result;
use state::MergeState;
use std::sync::Arc;

/// Fair, backpressured merge of a publisher of publishers.
///
/// Each downstream subscription gets its own independent operator state: the outer
/// source is subscribed once per downstream subscriber.
///
/// # Behavior
///
/// - Inner sources are admitted in the order the outer source emits them, at most
///   `max_concurrency` at a time. A finished inner source frees its place and one more
///   inner source is requested from the outer.
/// - Items are emitted round-robin, one per inner source per turn, skipping sources with
///   nothing buffered. Within one inner source, order is preserved.
/// - Each inner source is asked for `batch_size` items and asked again only after that
///   batch was fully emitted, so buffered items never exceed
///   `max_concurrency * batch_size`.
/// - Downstream signals are never issued concurrently, whatever thread the sources emit
///   on.
///
/// # Errors
///
/// With `delay_errors == false` the first error cancels every source and is signaled as
/// soon as possible; buffered items are discarded unless `flush_on_error` is set, in which
/// case the failing source's buffered items go first, while demand lasts. With
/// `delay_errors == true` errors are collected and signaled, combined, once every source
/// terminated. A downstream `request(0)` always fails immediately with
/// `BraidError::InvalidDemand`.
pub struct MergeInterleaved<T> {
    sources: SharedPublisher<SharedPublisher<T>>,
    config: InterleaveConfig,
}

impl<T: Send + 'static> MergeInterleaved<T> {
    /// Creates the operator from an already validated configuration.
    pub fn new(sources: SharedPublisher<SharedPublisher<T>>, config: InterleaveConfig) -> Self {
        Self { sources, config }
    }

    /// The configuration every subscription uses.
    pub fn config(&self) -> &InterleaveConfig {
        &self.config
    }
}

impl<T: Send + 'static> Publisher<T> for MergeInterleaved<T> {
    fn subscribe(&self, subscriber: SharedSubscriber<T>) {
        let state = MergeState::new(self.config, subscriber);
        state.start(&self.sources);
    }
}

/// Fluent configuration of [`MergeInterleaved`]. Values are validated by
/// [`build`](Self::build).
pub struct MergeInterleavedBuilder<T> {
    sources: SharedPublisher<SharedPublisher<T>>,
    max_concurrency: Option<usize>,
    batch_size: usize,
    delay_errors: bool,
    flush_on_error: bool,
}

impl<T: Send + 'static> MergeInterleavedBuilder<T> {
    fn new(sources: SharedPublisher<SharedPublisher<T>>) -> Self {
        Self {
            sources,
            max_concurrency: None,
            batch_size: DEFAULT_BATCH_SIZE,
            delay_errors: false,
            flush_on_error: false,
        }
    }

    /// Limits how many inner sources are subscribed at once.
    #[must_use]
    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }

    /// Admits every inner source as soon as it arrives (the default).
    #[must_use]
    pub fn unbounded_concurrency(mut self) -> Self {
        self.max_concurrency = None;
        self
    }

    /// Items requested from each inner source per request cycle.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Collects errors until every source terminated instead of failing fast.
    #[must_use]
    pub fn delay_errors(mut self, delay_errors: bool) -> Self {
        self.delay_errors = delay_errors;
        self
    }

    /// Emits the failing source's buffered items before an immediate error.
    #[must_use]
    pub fn flush_on_error(mut self, flush_on_error: bool) -> Self {
        self.flush_on_error = flush_on_error;
        self
    }

    /// Validates the configuration and creates the operator.
    ///
    /// # Errors
    ///
    /// Returns `BraidError::InvalidConfiguration` if `max_concurrency` or `batch_size`
    /// is zero.
    pub fn build(self) -> Result<SharedPublisher<T>> {
        let config = InterleaveConfig::new(self.max_concurrency, self.batch_size, self.delay_errors)?
            .with_flush_on_error(self.flush_on_error);
        Ok(Arc::new(MergeInterleaved::new(self.sources, config)))
    }
}

/// Starts configuring a merge-interleave of `sources`.
///
/// # Example
///
/// ```
/// use braid_core::{source, SharedPublisher};
/// use braid_interleave::merge_interleaved;
/// use braid_test_utils::TestExt;
///
/// let sources: SharedPublisher<SharedPublisher<u32>> =
///     source::from_iter(vec![source::repeat_n(1, 3), source::repeat_n(2, 2)]);
///
/// let merged = merge_interleaved(sources).batch_size(1).build()?;
/// merged.test(u64::MAX).assert_values(&[1, 2, 1, 2, 1]).assert_complete();
/// # Ok::<(), braid_error::BraidError>(())
/// ```
pub fn merge_interleaved<T: Send + 'static>(
    sources: SharedPublisher<SharedPublisher<T>>,
) -> MergeInterleavedBuilder<T> {
    MergeInterleavedBuilder::new(sources)
}

/// Creates a merge-interleave operator in one call.
///
/// # Errors
///
/// Returns `BraidError::InvalidConfiguration` if `max_concurrency` or `batch_size` is
/// zero.
pub fn merge_interleaved_with<T: Send + 'static>(
    sources: SharedPublisher<SharedPublisher<T>>,
    max_concurrency: usize,
    batch_size: usize,
    delay_errors: bool,
) -> Result<SharedPublisher<T>> {
    merge_interleaved(sources)
        .max_concurrency(max_concurrency)
        .batch_size(batch_size)
        .delay_errors(delay_errors)
        .build()
}

/// Method-call syntax for [`merge_interleaved`].
pub trait InterleaveExt<T> {
    /// Starts configuring a merge-interleave of the inner publishers.
    fn interleave(self) -> MergeInterleavedBuilder<T>;
}

impl<T: Send + 'static> InterleaveExt<T> for SharedPublisher<SharedPublisher<T>> {
    fn interleave(self) -> MergeInterleavedBuilder<T> {
        merge_interleaved(self)
    }
}
