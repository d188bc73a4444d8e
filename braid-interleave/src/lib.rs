// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Round-robin merging of many publishers into one, with bounded buffering.
//!
//! [`merge_interleaved`] subscribes to a publisher of publishers and emits their items
//! fairly: one item from each inner source per turn, in admission order. Concurrency,
//! batch size and error handling are configured through [`MergeInterleavedBuilder`].
//! [`flat_map_interleaved`] composes a mapping step in front of it.
//!
//! # Example
//!
//! ```
//! use braid_core::{source, SharedPublisher};
//! use braid_interleave::InterleaveExt;
//! use braid_test_utils::TestExt;
//!
//! let sources: SharedPublisher<SharedPublisher<u32>> = source::from_iter(vec![
//!     source::repeat(1),
//!     source::repeat(2),
//! ]);
//!
//! let merged = sources.interleave().max_concurrency(2).batch_size(1).build()?;
//! let ts = merged.test(5);
//!
//! ts.assert_values(&[1, 2, 1, 2, 1]).assert_not_terminated();
//! ts.cancel();
//! # Ok::<(), braid_error::BraidError>(())
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod config;
pub mod flat_map_interleaved;
mod logging;
pub mod merge_interleaved;

pub use self::config::{InterleaveConfig, DEFAULT_BATCH_SIZE};
pub use self::flat_map_interleaved::{
    flat_map_interleaved, flat_map_interleaved_builder, FlatMapInterleavedExt,
};
pub use self::merge_interleaved::{
    merge_interleaved, merge_interleaved_with, InterleaveExt, MergeInterleaved,
    MergeInterleavedBuilder,
};
