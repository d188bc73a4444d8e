// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::{BraidError, StreamItem};
use braid_stream::{Statistics, StatisticsExt};
use futures::{stream, StreamExt};

fn values(items: &[u32]) -> impl futures::Stream<Item = StreamItem<u32>> + '_ {
    stream::iter(items.iter().copied().map(StreamItem::Value))
}

#[tokio::test]
async fn test_collect_stats_starts_with_empty_statistics() -> anyhow::Result<()> {
    // Arrange
    let source = values(&[1, 4, 10, 20]);

    // Act
    let emitted: Vec<Statistics> = source
        .collect_stats()
        .map(StreamItem::into_result)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<_, _>>()?;

    // Assert
    assert_eq!(emitted.len(), 5);
    assert!(emitted[0].is_empty());
    assert!(emitted[0].mean().is_nan());
    let last = emitted[4];
    assert_eq!(last.count(), 4);
    assert_eq!(last.sum(), 35.0);
    assert_eq!(last.mean(), 8.75);
    assert!((last.sd() - 7.258_615_570_478_987).abs() < 1e-12);
    Ok(())
}

#[tokio::test]
async fn test_collect_stats_on_empty_stream_emits_only_empty_statistics() -> anyhow::Result<()> {
    // Act
    let emitted: Vec<StreamItem<Statistics>> = values(&[]).collect_stats().collect().await;

    // Assert
    assert_eq!(emitted.len(), 1);
    assert!(matches!(&emitted[0], StreamItem::Value(stats) if stats.count() == 0 && stats.sd().is_nan()));
    Ok(())
}

#[tokio::test]
async fn test_collect_stats_by_pairs_items_with_running_statistics() -> anyhow::Result<()> {
    // Arrange
    let words = stream::iter(["a", "abc", "ab"].map(StreamItem::Value));

    // Act
    let emitted: Vec<(&str, u64, f64)> = words
        .collect_stats_by(|word| word.len() as f64)
        .filter_map(|item| async move { item.ok() })
        .map(|(word, stats)| (word, stats.count(), stats.mean()))
        .collect()
        .await;

    // Assert
    assert_eq!(
        emitted,
        vec![("a", 1, 1.0), ("abc", 2, 2.0), ("ab", 3, 2.0)]
    );
    Ok(())
}

#[tokio::test]
async fn test_errors_pass_through_and_end_the_stream() -> anyhow::Result<()> {
    // Arrange
    let source = stream::iter(vec![
        StreamItem::Value(2u32),
        StreamItem::Error(BraidError::stream_error("sensor offline")),
        StreamItem::Value(3u32),
    ]);

    // Act
    let emitted: Vec<StreamItem<Statistics>> = source.collect_stats().collect().await;

    // Assert
    assert_eq!(emitted.len(), 3);
    assert!(matches!(&emitted[1], StreamItem::Value(stats) if stats.count() == 1));
    assert!(matches!(
        &emitted[2],
        StreamItem::Error(error) if error.to_string() == "Stream processing error: sensor offline"
    ));
    Ok(())
}
