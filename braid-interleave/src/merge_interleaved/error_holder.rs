// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::logging::warn;
use braid_error::BraidError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

struct Failure {
    error: BraidError,
    origin: Option<u64>,
}

/// Collects the errors reported by the outer source, the inner sources and the
/// downstream's own protocol violations.
///
/// In immediate mode only the first failure is kept; later ones are logged and dropped.
/// In delayed mode upstream errors accumulate until every source has terminated.
pub(super) struct ErrorHolder {
    delay: bool,
    failed: AtomicBool,
    failure: Mutex<Option<Failure>>,
    delayed: Mutex<Vec<BraidError>>,
}

impl ErrorHolder {
    pub(super) fn new(delay: bool) -> Self {
        Self {
            delay,
            failed: AtomicBool::new(false),
            failure: Mutex::new(None),
            delayed: Mutex::new(Vec::new()),
        }
    }

    /// Records an upstream error. `origin` is the ordinal of the failing inner source,
    /// `None` for the outer source.
    pub(super) fn record(&self, error: BraidError, origin: Option<u64>) {
        if self.delay {
            self.delayed.lock().push(error);
        } else {
            self.fail(error, origin);
        }
    }

    /// Records a failure that terminates the operator regardless of the error mode.
    pub(super) fn fail(&self, error: BraidError, origin: Option<u64>) {
        let mut failure = self.failure.lock();
        if failure.is_some() {
            warn!("merge_interleaved: dropping error after first failure: {}", error);
            return;
        }
        *failure = Some(Failure { error, origin });
        self.failed.store(true, Ordering::Release);
    }

    pub(super) fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Ordinal of the inner source whose error caused the failure.
    pub(super) fn failure_origin(&self) -> Option<u64> {
        self.failure.lock().as_ref().and_then(|failure| failure.origin)
    }

    pub(super) fn take_failure(&self) -> Option<BraidError> {
        self.failure.lock().take().map(|failure| failure.error)
    }

    /// Combines the delayed errors, if any.
    pub(super) fn take_delayed(&self) -> Option<BraidError> {
        let errors = std::mem::take(&mut *self.delayed.lock());
        BraidError::composite(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_mode_keeps_first_failure() {
        let holder = ErrorHolder::new(false);

        holder.record(BraidError::stream_error("first"), Some(1));
        holder.record(BraidError::stream_error("second"), Some(2));

        assert!(holder.is_failed());
        assert_eq!(holder.failure_origin(), Some(1));
        assert_eq!(
            holder.take_failure().map(|e| e.to_string()),
            Some("Stream processing error: first".to_string())
        );
        assert!(holder.take_delayed().is_none());
    }

    #[test]
    fn delayed_mode_combines_errors() {
        let holder = ErrorHolder::new(true);

        holder.record(BraidError::stream_error("a"), Some(0));
        holder.record(BraidError::stream_error("b"), None);

        assert!(!holder.is_failed());
        assert!(matches!(
            holder.take_delayed(),
            Some(BraidError::MultipleErrors { count: 2, .. })
        ));
    }

    #[test]
    fn fail_overrides_delayed_mode() {
        let holder = ErrorHolder::new(true);

        holder.fail(BraidError::invalid_demand(0), None);

        assert!(holder.is_failed());
        assert_eq!(holder.failure_origin(), None);
    }
}
