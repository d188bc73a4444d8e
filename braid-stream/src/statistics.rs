// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Running statistics over numeric streams.

use braid_core::StreamItem;
use futures::{ready, Stream};
use pin_project::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Count, sum, mean and population standard deviation of the values seen so far.
///
/// `mean` and `sd` are NaN while no value has been added.
///
/// ```
/// use braid_stream::Statistics;
///
/// let stats = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
///     .into_iter()
///     .fold(Statistics::new(), Statistics::add);
/// assert_eq!(stats.count(), 8);
/// assert!((stats.mean() - 5.0).abs() < 1e-12);
/// assert!((stats.sd() - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    count: u64,
    sum: f64,
    mean: f64,
    sd: f64,
    // Sum of squared deviations from the running mean.
    m2: f64,
}

impl Statistics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            mean: f64::NAN,
            sd: f64::NAN,
            m2: 0.0,
        }
    }

    /// Returns the statistics with `value` folded in.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn add(self, value: f64) -> Self {
        let count = self.count + 1;
        let previous_mean = if self.count == 0 { 0.0 } else { self.mean };
        let delta = value - previous_mean;
        let mean = previous_mean + delta / count as f64;
        let m2 = self.m2 + delta * (value - mean);
        Self {
            count,
            sum: self.sum + value,
            mean,
            sd: (m2 / count as f64).sqrt(),
            m2,
        }
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub const fn sum(&self) -> f64 {
        self.sum
    }

    #[must_use]
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    /// Population standard deviation.
    #[must_use]
    pub const fn sd(&self) -> f64 {
        self.sd
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension trait adding running statistics to streams of `StreamItem`s.
///
/// Errors are passed through and end the stream.
pub trait StatisticsExt<T>: Stream<Item = StreamItem<T>> + Sized {
    /// Emits the empty statistics first, then the updated statistics after each value.
    ///
    /// # Example
    ///
    /// ```
    /// use braid_core::StreamItem;
    /// use braid_stream::StatisticsExt;
    /// use futures::{executor::block_on, stream, StreamExt};
    ///
    /// let counts: Vec<u64> = block_on(
    ///     stream::iter([1u32, 2, 3].map(StreamItem::Value))
    ///         .collect_stats()
    ///         .filter_map(|stats| async move { stats.ok() })
    ///         .map(|stats| stats.count())
    ///         .collect(),
    /// );
    /// assert_eq!(counts, vec![0, 1, 2, 3]);
    /// ```
    fn collect_stats(self) -> CollectStats<Self>
    where
        T: Into<f64> + Copy,
    {
        CollectStats {
            stream: self,
            stats: Statistics::new(),
            started: false,
            done: false,
        }
    }

    /// Pairs every value with the statistics of `f` applied to all values so far.
    fn collect_stats_by<F>(self, f: F) -> CollectStatsBy<Self, F>
    where
        F: FnMut(&T) -> f64,
    {
        CollectStatsBy {
            stream: self,
            measure: f,
            stats: Statistics::new(),
            done: false,
        }
    }
}

impl<S, T> StatisticsExt<T> for S where S: Stream<Item = StreamItem<T>> {}

/// Stream returned by [`StatisticsExt::collect_stats`].
#[pin_project]
#[must_use = "streams do nothing unless polled"]
pub struct CollectStats<S> {
    #[pin]
    stream: S,
    stats: Statistics,
    started: bool,
    done: bool,
}

impl<S, T> Stream for CollectStats<S>
where
    S: Stream<Item = StreamItem<T>>,
    T: Into<f64> + Copy,
{
    type Item = StreamItem<Statistics>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }
        if !*this.started {
            *this.started = true;
            return Poll::Ready(Some(StreamItem::Value(*this.stats)));
        }
        match ready!(this.stream.poll_next(cx)) {
            Some(StreamItem::Value(value)) => {
                *this.stats = this.stats.add(value.into());
                Poll::Ready(Some(StreamItem::Value(*this.stats)))
            }
            Some(StreamItem::Error(error)) => {
                *this.done = true;
                Poll::Ready(Some(StreamItem::Error(error)))
            }
            None => {
                *this.done = true;
                Poll::Ready(None)
            }
        }
    }
}

/// Stream returned by [`StatisticsExt::collect_stats_by`].
#[pin_project]
#[must_use = "streams do nothing unless polled"]
pub struct CollectStatsBy<S, F> {
    #[pin]
    stream: S,
    measure: F,
    stats: Statistics,
    done: bool,
}

impl<S, T, F> Stream for CollectStatsBy<S, F>
where
    S: Stream<Item = StreamItem<T>>,
    F: FnMut(&T) -> f64,
{
    type Item = StreamItem<(T, Statistics)>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }
        match ready!(this.stream.poll_next(cx)) {
            Some(StreamItem::Value(item)) => {
                *this.stats = this.stats.add((this.measure)(&item));
                Poll::Ready(Some(StreamItem::Value((item, *this.stats))))
            }
            Some(StreamItem::Error(error)) => {
                *this.done = true;
                Poll::Ready(Some(StreamItem::Error(error)))
            }
            None => {
                *this.done = true;
                Poll::Ready(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_statistics_are_nan() {
        let stats = Statistics::new();
        assert!(stats.is_empty());
        assert!(stats.mean().is_nan());
        assert!(stats.sd().is_nan());
        assert_eq!(stats.sum(), 0.0);
    }

    #[test]
    fn single_value_has_zero_deviation() {
        let stats = Statistics::new().add(3.5);
        assert_eq!(stats.count(), 1);
        assert_eq!(stats.mean(), 3.5);
        assert_eq!(stats.sd(), 0.0);
    }

    #[test]
    fn population_deviation_matches_closed_form() {
        let stats = [1.0, 4.0, 10.0, 20.0]
            .into_iter()
            .fold(Statistics::new(), Statistics::add);
        assert_eq!(stats.count(), 4);
        assert_eq!(stats.sum(), 35.0);
        assert_eq!(stats.mean(), 8.75);
        assert!((stats.sd() - 7.258_615_570_478_987).abs() < 1e-12);
    }
}
