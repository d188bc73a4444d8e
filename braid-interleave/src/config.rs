// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::UNBOUNDED;
use braid_error::{BraidError, Result};

/// Items requested from each inner source per request cycle unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Validated, immutable settings of a merge-interleave operator.
///
/// # Example
///
/// ```
/// use braid_interleave::InterleaveConfig;
///
/// let config = InterleaveConfig::new(Some(4), 16, true)?;
/// assert_eq!(config.max_concurrency(), Some(4));
/// assert_eq!(config.batch_size(), 16);
/// assert!(config.delay_errors());
///
/// assert!(InterleaveConfig::new(Some(0), 16, true).is_err());
/// # Ok::<(), braid_error::BraidError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterleaveConfig {
    max_concurrency: Option<usize>,
    batch_size: usize,
    delay_errors: bool,
    flush_on_error: bool,
}

impl InterleaveConfig {
    /// Validates and creates a configuration. `None` admits every inner source at once.
    ///
    /// # Errors
    ///
    /// Returns `BraidError::InvalidConfiguration` if `max_concurrency` or `batch_size`
    /// is zero.
    pub const fn new(
        max_concurrency: Option<usize>,
        batch_size: usize,
        delay_errors: bool,
    ) -> Result<Self> {
        if let Some(0) = max_concurrency {
            return Err(BraidError::invalid_configuration("max_concurrency", 0));
        }
        if batch_size == 0 {
            return Err(BraidError::invalid_configuration("batch_size", 0));
        }
        Ok(Self {
            max_concurrency,
            batch_size,
            delay_errors,
            flush_on_error: false,
        })
    }

    /// Chooses whether the failing source's buffered items are still emitted before an
    /// immediate error. Only meaningful when errors are not delayed.
    #[must_use]
    pub const fn with_flush_on_error(mut self, flush_on_error: bool) -> Self {
        self.flush_on_error = flush_on_error;
        self
    }

    /// Maximum number of inner sources subscribed at the same time.
    #[must_use]
    pub const fn max_concurrency(&self) -> Option<usize> {
        self.max_concurrency
    }

    /// Items requested from an inner source per request cycle.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Whether errors are collected until every source has terminated.
    #[must_use]
    pub const fn delay_errors(&self) -> bool {
        self.delay_errors
    }

    /// Whether the failing source is flushed before an immediate error.
    #[must_use]
    pub const fn flush_on_error(&self) -> bool {
        self.flush_on_error
    }

    /// Demand issued to the outer source on subscription.
    pub(crate) const fn initial_outer_request(&self) -> u64 {
        match self.max_concurrency {
            Some(limit) => limit as u64,
            None => UNBOUNDED,
        }
    }

    /// Upper bound of items held in inner buffers at any time, if concurrency is bounded.
    #[must_use]
    pub const fn buffer_bound(&self) -> Option<usize> {
        match self.max_concurrency {
            Some(limit) => Some(limit.saturating_mul(self.batch_size)),
            None => None,
        }
    }
}

impl Default for InterleaveConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            batch_size: DEFAULT_BATCH_SIZE,
            delay_errors: false,
            flush_on_error: false,
        }
    }
}
