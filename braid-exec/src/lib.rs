// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Async bridges for Braid publishers.
//!
//! - [`PublisherStream`] turns any publisher into a [`futures::Stream`] of
//!   [`StreamItem`](braid_core::StreamItem)s, requesting items in `prefetch` sized chunks.
//! - [`from_stream`] goes the other way: it wraps a stream factory into a publisher whose
//!   tokio task only polls while the subscriber has demand.
//!
//! Both ends honor cancellation: dropping a [`PublisherStream`] cancels its subscription
//! and cancelling a [`StreamPublisher`] subscription stops its task.

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
mod logging;
pub mod publisher_stream;
pub mod stream_publisher;

pub use self::publisher_stream::{IntoStreamExt, PublisherStream};
pub use self::stream_publisher::{from_stream, StreamPublisher};
