// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Collaborators that sit around the interleaving operator.
//!
//! [`Cached`] and [`ResettableCache`] share one upstream subscription among many
//! subscribers and replay what was recorded. [`Statistics`] is a plain running fold and
//! [`StatisticsExt`] applies it to streams of [`StreamItem`](braid_core::StreamItem)s.

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod cached;
mod logging;
pub mod resettable_cache;
pub mod statistics;

pub use self::cached::{cached, Cached};
pub use self::resettable_cache::ResettableCache;
pub use self::statistics::{CollectStats, CollectStatsBy, Statistics, StatisticsExt};
