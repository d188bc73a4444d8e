// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::{BraidError, StreamItem};
use braid_exec::{from_stream, IntoStreamExt};
use braid_test_utils::{TestExt, AWAIT_TIMEOUT};
use futures::{stream, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_from_stream_emits_items_and_completes() -> anyhow::Result<()> {
    // Arrange
    let publisher = from_stream(|| stream::iter(vec![1, 2, 3]).map(StreamItem::Value));

    // Act
    let ts = publisher.test(u64::MAX);

    // Assert
    assert!(ts.await_done(AWAIT_TIMEOUT));
    ts.assert_values(&[1, 2, 3]).assert_complete();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_from_stream_polls_only_while_demand_is_positive() -> anyhow::Result<()> {
    // Arrange
    let polled = Arc::new(AtomicUsize::new(0));
    let publisher = {
        let polled = Arc::clone(&polled);
        from_stream(move || {
            let polled = Arc::clone(&polled);
            stream::iter(0u64..).map(move |n| {
                polled.fetch_add(1, Ordering::SeqCst);
                StreamItem::Value(n)
            })
        })
    };

    // Act
    let ts = publisher.test(2);
    assert!(ts.await_count(2, AWAIT_TIMEOUT));
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Assert
    assert_eq!(polled.load(Ordering::SeqCst), 2);
    ts.assert_values(&[0, 1]).assert_not_terminated();

    // Act
    ts.request_more(3);

    // Assert
    assert!(ts.await_count(5, AWAIT_TIMEOUT));
    ts.assert_values(&[0, 1, 2, 3, 4]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_from_stream_error_item_terminates() -> anyhow::Result<()> {
    // Arrange
    let publisher = from_stream(|| {
        stream::iter(vec![
            StreamItem::Value(1),
            StreamItem::Error(BraidError::stream_error("inside stream")),
            StreamItem::Value(2),
        ])
    });

    // Act
    let ts = publisher.test(u64::MAX);

    // Assert
    assert!(ts.await_done(AWAIT_TIMEOUT));
    ts.assert_values(&[1])
        .assert_error_message("Stream processing error: inside stream");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_from_stream_cancel_stops_the_task() -> anyhow::Result<()> {
    // Arrange
    let publisher = from_stream(|| stream::iter(0u32..).map(StreamItem::Value));
    let ts = publisher.test(1);
    assert!(ts.await_count(1, AWAIT_TIMEOUT));

    // Act
    ts.cancel();
    ts.request_more(10);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Assert
    ts.assert_values(&[0]).assert_not_terminated();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_from_stream_cancel_interrupts_a_pending_stream() -> anyhow::Result<()> {
    // Arrange
    let publisher = from_stream(stream::pending::<StreamItem<u32>>);
    let ts = publisher.test(1);

    // Act
    ts.cancel();
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Assert
    ts.assert_no_values().assert_not_terminated();
    assert!(ts.is_cancelled());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_from_stream_rejects_zero_request() -> anyhow::Result<()> {
    // Arrange
    let publisher = from_stream(|| stream::iter(0u32..).map(StreamItem::Value));
    let ts = publisher.test(0);

    // Act
    ts.request_more(0);

    // Assert
    assert!(ts.await_done(AWAIT_TIMEOUT));
    ts.assert_no_values()
        .assert_error(|error| matches!(error, BraidError::InvalidDemand { requested: 0 }));
    Ok(())
}

#[test]
fn test_from_stream_outside_runtime_fails() -> anyhow::Result<()> {
    // Arrange
    let publisher = from_stream(|| stream::iter(vec![1u32]).map(StreamItem::Value));

    // Act
    let ts = publisher.test(1);

    // Assert
    ts.assert_no_values()
        .assert_error_message("Stream processing error: from_stream requires a running tokio runtime");
    Ok(())
}

#[tokio::test]
async fn test_from_stream_round_trips_through_into_stream() -> anyhow::Result<()> {
    // Arrange
    let publisher = from_stream(|| {
        stream::iter(0u32..100).then(|n| async move {
            tokio::task::yield_now().await;
            StreamItem::Value(n)
        })
    });

    // Act
    let items: Vec<Option<u32>> = publisher.into_stream(7).map(StreamItem::ok).collect().await;

    // Assert
    assert_eq!(items, (0..100).map(Some).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_runtime_shutdown_fails_with_cancelled() -> anyhow::Result<()> {
    // Arrange
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let publisher = from_stream(stream::pending::<StreamItem<u32>>);
    let ts = {
        let _entered = runtime.enter();
        publisher.test(1)
    };

    // Act
    drop(runtime);

    // Assert
    ts.assert_no_values()
        .assert_error(|error| matches!(error, BraidError::Cancelled));
    Ok(())
}
