// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::{source, SharedPublisher};
use braid_interleave::merge_interleaved;
use braid_test_utils::{subscribe_on_thread, TestExt, AWAIT_TIMEOUT};
use std::sync::Arc;
use std::thread;

const SOURCES: u32 = 8;
const PER_SOURCE: u32 = 5_000;

fn threaded_sources() -> SharedPublisher<SharedPublisher<u32>> {
    let inner: Vec<SharedPublisher<u32>> = (0..SOURCES)
        .map(|i| subscribe_on_thread(source::range(i * 1_000_000, PER_SOURCE)))
        .collect();
    source::from_iter(inner)
}

#[test]
fn test_threaded_sources_are_delivered_serially() -> anyhow::Result<()> {
    // Arrange
    let merged = merge_interleaved(threaded_sources())
        .max_concurrency(SOURCES as usize)
        .batch_size(16)
        .build()?;

    // Act
    let ts = merged.test(u64::MAX);

    // Assert
    assert!(ts.await_done(AWAIT_TIMEOUT));
    ts.assert_value_count((SOURCES * PER_SOURCE) as usize)
        .assert_complete()
        .assert_serialized();
    Ok(())
}

#[test]
fn test_threaded_sources_preserve_per_source_order() -> anyhow::Result<()> {
    // Arrange
    let merged = merge_interleaved(threaded_sources())
        .max_concurrency(3)
        .batch_size(7)
        .build()?;

    // Act
    let ts = merged.test(u64::MAX);

    // Assert
    assert!(ts.await_done(AWAIT_TIMEOUT));
    ts.assert_complete();
    let values = ts.values();
    for i in 0..SOURCES {
        let base = i * 1_000_000;
        let from_source: Vec<u32> = values
            .iter()
            .copied()
            .filter(|v| (base..base + PER_SOURCE).contains(v))
            .collect();
        let expected: Vec<u32> = (base..base + PER_SOURCE).collect();
        assert_eq!(from_source, expected);
    }
    Ok(())
}

#[test]
fn test_concurrent_requests_are_all_honored() -> anyhow::Result<()> {
    // Arrange
    let merged = merge_interleaved(threaded_sources())
        .max_concurrency(4)
        .batch_size(8)
        .build()?;
    let ts = merged.test(0);

    // Act
    let requesters: Vec<_> = (0..4)
        .map(|_| {
            let ts = Arc::clone(&ts);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    ts.request_more(1);
                }
            })
        })
        .collect();
    for requester in requesters {
        requester.join().map_err(|_| anyhow::anyhow!("requester panicked"))?;
    }

    // Assert
    assert!(ts.await_count(4_000, AWAIT_TIMEOUT));
    ts.assert_value_count(4_000)
        .assert_not_terminated()
        .assert_serialized();
    Ok(())
}

#[test]
fn test_cancel_from_another_thread_stops_delivery() -> anyhow::Result<()> {
    // Arrange
    let merged = merge_interleaved(threaded_sources())
        .max_concurrency(2)
        .batch_size(4)
        .build()?;
    let ts = merged.test(u64::MAX);
    assert!(ts.await_count(100, AWAIT_TIMEOUT));

    // Act
    let canceller = {
        let ts = Arc::clone(&ts);
        thread::spawn(move || ts.cancel())
    };
    canceller
        .join()
        .map_err(|_| anyhow::anyhow!("canceller panicked"))?;
    let after_cancel = ts.value_count();
    ts.request_more(1_000);

    // Assert
    assert!(ts.value_count() <= after_cancel + 1);
    ts.assert_serialized();
    Ok(())
}
