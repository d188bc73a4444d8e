// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Braid
//!
//! Fair, backpressured interleaving of reactive publishers.
//!
//! ## Overview
//!
//! Braid merges a publisher of publishers into a single publisher. Inner sources take
//! turns, one item each, and never buffer more than one batch. Demand flows from the
//! subscriber to the inner sources, and new inner sources are only pulled from the
//! outer publisher when a concurrency slot is free.
//!
//! The workspace is split the same way this facade is:
//!
//! - `braid-core`: the publisher/subscriber contract and cold sources
//! - `braid-interleave`: [`merge_interleaved`] and [`flat_map_interleaved`]
//! - `braid-stream`: replay caches and running statistics
//! - `braid-exec` (feature `runtime-tokio`): bridges to and from `futures::Stream`
//!
//! ## Quick Start
//!
//! ```rust
//! use braid::prelude::*;
//! use braid_test_utils::TestExt;
//!
//! let merged = source::range(0, 3)
//!     .flat_map_interleaved(|n| source::repeat_n(n, 2), 3)?;
//!
//! merged
//!     .test(u64::MAX)
//!     .assert_values(&[0, 1, 2, 0, 1, 2])
//!     .assert_complete();
//! # Ok::<(), BraidError>(())
//! ```

pub use braid_core::{
    source, DemandTracker, NoopSubscription, Publisher, SharedPublisher, SharedSubscriber,
    SharedSubscription, StreamItem, Subscriber, Subscription, SubscriptionCell, UNBOUNDED,
};
pub use braid_error::{BraidError, IntoBraidError, Result, ResultExt};
pub use braid_interleave::{
    flat_map_interleaved, flat_map_interleaved_builder, merge_interleaved,
    merge_interleaved_with, FlatMapInterleavedExt, InterleaveConfig, InterleaveExt,
    MergeInterleaved, MergeInterleavedBuilder, DEFAULT_BATCH_SIZE,
};
pub use braid_stream::{
    cached, Cached, CollectStats, CollectStatsBy, ResettableCache, Statistics, StatisticsExt,
};

#[cfg(feature = "runtime-tokio")]
pub use braid_exec::{from_stream, IntoStreamExt, PublisherStream, StreamPublisher};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        merge_interleaved, source, BraidError, FlatMapInterleavedExt, InterleaveExt, Publisher,
        SharedPublisher, StatisticsExt, StreamItem, Subscriber, Subscription,
    };

    #[cfg(feature = "runtime-tokio")]
    pub use crate::{from_stream, IntoStreamExt};
}
