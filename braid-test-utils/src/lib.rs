// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities for the Braid reactive interleaving library.
//!
//! This crate is meant for development and testing only.
//!
//! # Key Types
//!
//! - [`TestSubscriber`]: records every signal, detects overlapping signals, exposes
//!   `request_more` / `cancel`, and offers chainable assertions. Obtain one with
//!   [`TestExt::test`] on any publisher.
//! - [`ManualPublisher`]: a source pushed by the test itself, recording the demand and
//!   cancellation it receives.
//! - [`probe`]: wraps any publisher and counts requests, deliveries and cancellations.
//! - [`burst`]: pushes fixed items and a terminal signal eagerly, ignoring demand.
//! - [`subscribe_on_thread`]: moves subscription, and thus initial emission, to a new
//!   thread.
//!
//! # Example
//!
//! ```rust
//! use braid_test_utils::{ManualPublisher, TestExt};
//!
//! let manual = ManualPublisher::<u32>::new();
//! let ts = manual.shared().test(2);
//!
//! assert_eq!(manual.requested(), 2);
//! manual.emit(7);
//! manual.complete();
//!
//! ts.assert_values(&[7]).assert_complete();
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod burst;
pub mod manual_publisher;
pub mod probe;
pub mod test_subscriber;
pub mod threaded;

pub use burst::burst;
pub use manual_publisher::ManualPublisher;
pub use probe::{probe, ProbeStats};
pub use test_subscriber::{TestExt, TestSubscriber};
pub use threaded::subscribe_on_thread;

use std::time::Duration;

/// Default wait used by tests that involve other threads.
pub const AWAIT_TIMEOUT: Duration = Duration::from_secs(10);
