// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::{Publisher, SharedPublisher, SharedSubscriber};
use std::sync::Arc;
use std::thread;

struct SubscribeOnThread<T> {
    source: SharedPublisher<T>,
}

/// Wraps `source` so that every subscription is made from a freshly spawned thread.
///
/// Items requested during `on_subscribe` are therefore emitted on that thread, while
/// later requests run on whichever thread issues them. Useful to exercise operators
/// against sources signaling from several threads at once.
pub fn subscribe_on_thread<T: Send + 'static>(source: SharedPublisher<T>) -> SharedPublisher<T> {
    Arc::new(SubscribeOnThread { source })
}

impl<T: Send + 'static> Publisher<T> for SubscribeOnThread<T> {
    fn subscribe(&self, subscriber: SharedSubscriber<T>) {
        let source = Arc::clone(&self.source);
        thread::spawn(move || source.subscribe(subscriber));
    }
}
