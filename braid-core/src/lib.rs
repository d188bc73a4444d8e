// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Core contract for Braid publishers.
//!
//! This crate defines the demand-driven push protocol every Braid operator is built on:
//!
//! - [`Publisher`] hands a [`Subscription`] to each [`Subscriber`] through `on_subscribe`.
//! - The subscriber signals demand with [`Subscription::request`]; the publisher never
//!   delivers more `on_next` signals than were requested.
//! - A subscription ends with at most one `on_complete` or `on_error`, or with
//!   [`Subscription::cancel`] from the subscriber side.
//!
//! Supporting pieces shared by operators live here as well: [`DemandTracker`] for atomic
//! demand arithmetic, [`SubscriptionCell`] for set-once upstream handles, and the cold
//! sources in [`source`].
//!
//! # Example
//!
//! ```
//! use braid_core::{source, Publisher, SharedSubscription, Subscriber};
//! use braid_error::BraidError;
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Collect(Mutex<Vec<u32>>);
//!
//! impl Subscriber<u32> for Collect {
//!     fn on_subscribe(&self, subscription: SharedSubscription) {
//!         subscription.request(u64::MAX);
//!     }
//!     fn on_next(&self, item: u32) {
//!         self.0.lock().push(item);
//!     }
//!     fn on_error(&self, _error: BraidError) {}
//!     fn on_complete(&self) {}
//! }
//!
//! let collect = Arc::new(Collect::default());
//! source::range(1, 3).subscribe(collect.clone());
//! assert_eq!(*collect.0.lock(), vec![1, 2, 3]);
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod demand_tracker;
mod logging;
pub mod publisher;
pub mod source;
pub mod stream_item;
pub mod subscriber;
pub mod subscription;
pub mod subscription_cell;

pub use self::demand_tracker::{DemandTracker, UNBOUNDED};
pub use self::publisher::{Publisher, SharedPublisher};
pub use self::stream_item::StreamItem;
pub use self::subscriber::{SharedSubscriber, Subscriber};
pub use self::subscription::{NoopSubscription, SharedSubscription, Subscription};
pub use self::subscription_cell::SubscriptionCell;
pub use braid_error::{BraidError, Result};
