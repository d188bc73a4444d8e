// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions)]
//! Error types for the Braid reactive interleaving library
//!
//! This crate defines the root [`BraidError`] type shared by every publisher, subscriber
//! and operator in the workspace. Errors travel downstream through
//! `Subscriber::on_error` exactly once per subscription, so the type is cheap to clone:
//! wrapped causes are held behind an [`Arc`].
//!
//! # Examples
//!
//! ```
//! use braid_error::{BraidError, Result};
//!
//! fn validate(batch_size: usize) -> Result<usize> {
//!     if batch_size == 0 {
//!         return Err(BraidError::invalid_configuration("batch_size", batch_size));
//!     }
//!     Ok(batch_size)
//! }
//!
//! assert!(validate(0).is_err());
//! ```

use std::sync::Arc;

/// Root error type for all Braid operations
///
/// Configuration errors are returned synchronously from builders and never reach a
/// subscriber. Every other variant is delivered as a terminal `on_error` signal.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BraidError {
    /// A builder parameter is out of range
    ///
    /// Raised synchronously by `build()`; never delivered to a subscriber.
    #[error("Invalid configuration: {parameter} must be at least 1 (got {value})")]
    InvalidConfiguration {
        /// Name of the offending parameter
        parameter: &'static str,
        /// The rejected value
        value: usize,
    },

    /// A subscriber requested a non-positive number of items
    ///
    /// This is a protocol violation. It cancels the upstream and terminates the
    /// subscription with this error.
    #[error("Invalid demand: request must be positive (got {requested})")]
    InvalidDemand {
        /// The rejected request amount
        requested: u64,
    },

    /// An upstream publisher signaled an error
    ///
    /// Wraps the original cause produced by an outer or inner source.
    #[error("Upstream error: {0}")]
    Upstream(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// Stream processing encountered an error described only by a message
    #[error("Stream processing error: {context}")]
    StreamProcessingError {
        /// Description of what went wrong during stream processing
        context: String,
    },

    /// An upstream emitted more items than were requested from it
    #[error("Missing backpressure: {resource} received more than {limit} requested items")]
    MissingBackpressure {
        /// Name of the bounded buffer that overflowed
        resource: String,
        /// The bound that was exceeded
        limit: usize,
    },

    /// Multiple errors occurred
    ///
    /// Produced when several sources fail while errors are being delayed.
    #[error("Multiple errors occurred: {count} errors")]
    MultipleErrors {
        /// Number of errors that occurred
        count: usize,
        /// The individual errors in the order they were recorded
        errors: Vec<BraidError>,
    },

    /// The consumer went away before the stream terminated
    #[error("Subscription cancelled")]
    Cancelled,
}

impl BraidError {
    /// Create a configuration error for the named parameter
    #[must_use]
    pub const fn invalid_configuration(parameter: &'static str, value: usize) -> Self {
        Self::InvalidConfiguration { parameter, value }
    }

    /// Create an invalid demand error
    #[must_use]
    pub const fn invalid_demand(requested: u64) -> Self {
        Self::InvalidDemand { requested }
    }

    /// Wrap an upstream cause
    pub fn upstream(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Upstream(Arc::new(error))
    }

    /// Create a stream processing error with the given context
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamProcessingError {
            context: context.into(),
        }
    }

    /// Create a missing backpressure error for the named buffer
    pub fn missing_backpressure(resource: impl Into<String>, limit: usize) -> Self {
        Self::MissingBackpressure {
            resource: resource.into(),
            limit,
        }
    }

    /// Aggregate delayed errors into a single terminal error
    ///
    /// A single error is returned unchanged; an empty vector yields `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use braid_error::BraidError;
    ///
    /// let one = BraidError::composite(vec![BraidError::stream_error("a")]);
    /// assert!(matches!(one, Some(BraidError::StreamProcessingError { .. })));
    ///
    /// let two = BraidError::composite(vec![
    ///     BraidError::stream_error("a"),
    ///     BraidError::stream_error("b"),
    /// ]);
    /// assert!(matches!(two, Some(BraidError::MultipleErrors { count: 2, .. })));
    /// assert!(BraidError::composite(Vec::new()).is_none());
    /// ```
    #[must_use]
    pub fn composite(mut errors: Vec<BraidError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            count => Some(Self::MultipleErrors { count, errors }),
        }
    }

    /// Check if this error originated in an upstream source
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Upstream(_) | Self::StreamProcessingError { .. } | Self::MultipleErrors { .. }
        )
    }

    /// Check if this error reports a reactive-streams protocol violation
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDemand { .. } | Self::MissingBackpressure { .. }
        )
    }
}

/// Specialized Result type for Braid operations
///
/// # Examples
///
/// ```
/// use braid_error::Result;
///
/// fn process() -> Result<u64> {
///     Ok(1)
/// }
/// ```
pub type Result<T> = std::result::Result<T, BraidError>;

/// Extension trait for converting foreign errors into an upstream `BraidError`
pub trait IntoBraidError {
    /// Convert this error into a `BraidError`, prefixing the message with `context`
    fn into_braid_error(self, context: &str) -> BraidError;

    /// Convert this error into an upstream `BraidError` without additional context
    fn into_braid(self) -> BraidError
    where
        Self: Sized;
}

impl<E: std::error::Error + Send + Sync + 'static> IntoBraidError for E {
    fn into_braid_error(self, context: &str) -> BraidError {
        if context.is_empty() {
            BraidError::upstream(self)
        } else {
            BraidError::stream_error(format!("{context}: {self}"))
        }
    }

    fn into_braid(self) -> BraidError {
        BraidError::upstream(self)
    }
}

/// Helper trait for adding context to `Result`s
///
/// Upstream errors are flattened into a `StreamProcessingError` carrying the context;
/// every other variant is preserved as-is.
pub trait ResultExt<T> {
    /// Add context to an error
    ///
    /// # Errors
    /// Returns `Err(BraidError)` if the underlying result is `Err`.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context to an error using a closure (lazy evaluation)
    ///
    /// # Errors
    /// Returns `Err(BraidError)` if the underlying result is `Err`.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<BraidError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| attach_context(e.into(), context.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| attach_context(e.into(), f()))
    }
}

fn attach_context(error: BraidError, context: String) -> BraidError {
    match error {
        BraidError::Upstream(inner) => BraidError::StreamProcessingError {
            context: format!("{context}: {inner}"),
        },
        other => other,
    }
}
