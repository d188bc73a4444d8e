// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::publisher::Publisher;
use crate::subscriber::SharedSubscriber;
use crate::subscription::NoopSubscription;
use braid_error::BraidError;
use std::marker::PhantomData;
use std::sync::Arc;

/// What a [`SignalPublisher`] does right after `on_subscribe`.
#[derive(Debug, Clone)]
pub enum Terminal {
    /// Complete immediately.
    Complete,
    /// Fail immediately with a clone of the error.
    Error(BraidError),
    /// Never signal again.
    Never,
}

/// A publisher that emits no items and ends with a fixed terminal behavior.
#[derive(Debug)]
pub struct SignalPublisher<T> {
    terminal: Terminal,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SignalPublisher<T> {
    /// Creates a publisher with the given terminal behavior.
    pub const fn new(terminal: Terminal) -> Self {
        Self {
            terminal,
            _marker: PhantomData,
        }
    }
}

impl<T: Send + 'static> Publisher<T> for SignalPublisher<T> {
    fn subscribe(&self, subscriber: SharedSubscriber<T>) {
        subscriber.on_subscribe(Arc::new(NoopSubscription));
        match &self.terminal {
            Terminal::Complete => subscriber.on_complete(),
            Terminal::Error(error) => subscriber.on_error(error.clone()),
            Terminal::Never => {}
        }
    }
}
