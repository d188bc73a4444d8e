// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::{NoopSubscription, Publisher, SharedPublisher, SharedSubscriber};
use braid_error::BraidError;
use std::sync::Arc;

struct Burst<T> {
    items: Vec<T>,
    error: Option<BraidError>,
}

/// A source that pushes all `items` while being subscribed, then completes or fails
/// with `error`.
///
/// Demand is ignored on purpose: it models sources that emit eagerly and lets tests
/// arrange items and an error to arrive before anything is drained.
pub fn burst<T>(items: Vec<T>, error: Option<BraidError>) -> SharedPublisher<T>
where
    T: Clone + Send + Sync + 'static,
{
    Arc::new(Burst { items, error })
}

impl<T: Clone + Send + Sync + 'static> Publisher<T> for Burst<T> {
    fn subscribe(&self, subscriber: SharedSubscriber<T>) {
        subscriber.on_subscribe(Arc::new(NoopSubscription));
        for item in &self.items {
            subscriber.on_next(item.clone());
        }
        match &self.error {
            Some(error) => subscriber.on_error(error.clone()),
            None => subscriber.on_complete(),
        }
    }
}
