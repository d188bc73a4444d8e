// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::{source, BraidError};
use braid_stream::{cached, Cached, ResettableCache};
use braid_test_utils::{probe, ManualPublisher, TestExt};
use std::sync::Arc;

#[test]
fn test_cached_subscribes_upstream_once() -> anyhow::Result<()> {
    // Arrange
    let (counted, stats) = probe(source::range(0, 4));
    let cache = cached(counted);

    // Act
    let first = cache.test(u64::MAX);
    let second = cache.test(u64::MAX);

    // Assert
    first.assert_values(&[0, 1, 2, 3]).assert_complete();
    second.assert_values(&[0, 1, 2, 3]).assert_complete();
    assert_eq!(stats.subscriptions(), 1);
    Ok(())
}

#[test]
fn test_cached_replay_respects_each_subscribers_demand() -> anyhow::Result<()> {
    // Arrange
    let cache = cached(source::range(0, 5));
    let eager = cache.test(u64::MAX);

    // Act
    let slow = cache.test(2);

    // Assert
    eager.assert_value_count(5).assert_complete();
    slow.assert_values(&[0, 1]).assert_not_terminated();

    // Act
    slow.request_more(10);

    // Assert
    slow.assert_values(&[0, 1, 2, 3, 4]).assert_complete();
    Ok(())
}

#[test]
fn test_cached_delivers_live_items_after_replay() -> anyhow::Result<()> {
    // Arrange
    let manual = ManualPublisher::<u32>::new();
    let cache = Cached::new(manual.shared());
    let early = cache.test(u64::MAX);
    manual.emit(1);

    // Act
    let late = cache.test(u64::MAX);
    manual.emit(2);
    manual.complete();

    // Assert
    assert!(cache.is_connected());
    assert_eq!(manual.requested(), u64::MAX);
    early.assert_values(&[1, 2]).assert_complete();
    late.assert_values(&[1, 2]).assert_complete();
    Ok(())
}

#[test]
fn test_cached_replays_recorded_error() -> anyhow::Result<()> {
    // Arrange
    let manual = ManualPublisher::<u32>::new();
    let cache = cached(manual.shared());
    let _first = cache.test(u64::MAX);
    manual.emit(7);
    manual.fail(BraidError::stream_error("recorded"));

    // Act
    let late = cache.test(u64::MAX);

    // Assert
    late.assert_values(&[7])
        .assert_error_message("Stream processing error: recorded");
    Ok(())
}

#[test]
fn test_cancelling_a_replay_keeps_upstream_alive() -> anyhow::Result<()> {
    // Arrange
    let manual = ManualPublisher::<u32>::new();
    let cache = cached(manual.shared());
    let cancelled = cache.test(u64::MAX);
    let kept = cache.test(u64::MAX);

    // Act
    cancelled.cancel();
    manual.emit(1);

    // Assert
    assert!(!manual.is_cancelled());
    cancelled.assert_no_values();
    kept.assert_values(&[1]);
    Ok(())
}

#[test]
fn test_cached_rejects_zero_request() -> anyhow::Result<()> {
    // Arrange
    let cache = cached(source::range(0, 3));
    let ts = cache.test(1);

    // Act
    ts.request_more(0);

    // Assert
    ts.assert_values(&[0])
        .assert_error(|error| matches!(error, BraidError::InvalidDemand { requested: 0 }));
    Ok(())
}

#[test]
fn test_resettable_cache_is_lazy_until_first_subscriber() -> anyhow::Result<()> {
    // Arrange
    let (counted, stats) = probe(source::range(0, 2));

    // Act
    let cache = Arc::new(ResettableCache::new(counted));

    // Assert
    assert_eq!(stats.subscriptions(), 0);
    cache.test(u64::MAX).assert_values(&[0, 1]);
    assert_eq!(stats.subscriptions(), 1);
    Ok(())
}

#[test]
fn test_reset_triggers_a_fresh_upstream_subscription() -> anyhow::Result<()> {
    // Arrange
    let manual = ManualPublisher::<u32>::new();
    let cache = ResettableCache::new(manual.shared());
    let before = cache.test(u64::MAX);
    manual.emit(1);
    manual.complete();

    // Act
    cache.reset();
    let after = cache.test(u64::MAX);
    manual.emit(2);

    // Assert
    before.assert_values(&[1]).assert_complete();
    after.assert_values(&[2]).assert_not_terminated();
    assert_eq!(manual.subscription_count(), 2);
    Ok(())
}

#[test]
fn test_subscribers_between_resets_share_the_cache() -> anyhow::Result<()> {
    // Arrange
    let (counted, stats) = probe(source::range(5, 2));
    let cache = ResettableCache::new(counted);

    // Act
    let first = cache.test(u64::MAX);
    let second = cache.test(u64::MAX);
    cache.reset();
    cache.reset();
    let third = cache.test(u64::MAX);

    // Assert
    first.assert_values(&[5, 6]);
    second.assert_values(&[5, 6]);
    third.assert_values(&[5, 6]);
    assert_eq!(stats.subscriptions(), 2);
    Ok(())
}
