// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::state::MergeState;
use braid_core::{SharedPublisher, SharedSubscription, Subscriber};
use braid_error::BraidError;
use std::sync::Arc;

/// Subscriber attached to the source of sources.
///
/// Holds the operator state alive for as long as the outer source references it; the
/// state releases the outer subscription on termination, which breaks the cycle.
pub(super) struct OuterSubscriber<T> {
    state: Arc<MergeState<T>>,
}

impl<T> OuterSubscriber<T> {
    pub(super) fn new(state: Arc<MergeState<T>>) -> Self {
        Self { state }
    }
}

impl<T: Send + 'static> Subscriber<SharedPublisher<T>> for OuterSubscriber<T> {
    fn on_subscribe(&self, subscription: SharedSubscription) {
        self.state.set_outer(subscription);
    }

    fn on_next(&self, source: SharedPublisher<T>) {
        self.state.admit(source);
    }

    fn on_error(&self, error: BraidError) {
        self.state.outer_error(error);
    }

    fn on_complete(&self) {
        self.state.outer_complete();
    }
}
