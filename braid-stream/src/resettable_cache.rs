// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::cached::Cached;
use crate::logging::debug;
use braid_core::{Publisher, SharedPublisher, SharedSubscriber};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A [`Cached`] source that can be told to start over.
///
/// A refresh is pending initially. The subscriber that finds a refresh pending builds a
/// new cache, which subscribes to the source again; everyone else shares the current
/// cache. Subscribers of a replaced cache keep their recording.
///
/// # Example
///
/// ```
/// use braid_core::source;
/// use braid_stream::ResettableCache;
/// use braid_test_utils::{probe, TestExt};
///
/// let (counted, stats) = probe(source::range(0, 2));
/// let cache = ResettableCache::new(counted);
///
/// cache.test(u64::MAX).assert_values(&[0, 1]);
/// cache.test(u64::MAX).assert_values(&[0, 1]);
/// assert_eq!(stats.subscriptions(), 1);
///
/// cache.reset();
/// cache.test(u64::MAX).assert_values(&[0, 1]);
/// assert_eq!(stats.subscriptions(), 2);
/// ```
pub struct ResettableCache<T> {
    source: SharedPublisher<T>,
    refresh: AtomicBool,
    current: Mutex<Option<Arc<Cached<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> ResettableCache<T> {
    /// Wraps `source`; the first subscriber triggers the upstream subscription.
    pub fn new(source: SharedPublisher<T>) -> Self {
        Self {
            source,
            refresh: AtomicBool::new(true),
            current: Mutex::new(None),
        }
    }

    /// Makes the next subscriber trigger a fresh subscription to the source.
    pub fn reset(&self) {
        debug!("cache reset requested");
        self.refresh.store(true, Ordering::Release);
    }

    fn current_cache(&self) -> Arc<Cached<T>> {
        let mut current = self.current.lock();
        let refresh = self.refresh.swap(false, Ordering::AcqRel);
        match &*current {
            Some(cache) if !refresh => Arc::clone(cache),
            _ => {
                let fresh = Arc::new(Cached::new(self.source.clone()));
                *current = Some(Arc::clone(&fresh));
                fresh
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Publisher<T> for ResettableCache<T> {
    fn subscribe(&self, subscriber: SharedSubscriber<T>) {
        let cache = self.current_cache();
        cache.subscribe(subscriber);
    }
}
