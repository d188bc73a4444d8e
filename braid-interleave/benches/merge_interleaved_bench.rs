// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::{source, BraidError, SharedPublisher, SharedSubscription, Subscriber};
use braid_interleave::{flat_map_interleaved, merge_interleaved};
use criterion::{BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Counting {
    count: AtomicU64,
}

impl Subscriber<u32> for Counting {
    fn on_subscribe(&self, subscription: SharedSubscription) {
        subscription.request(u64::MAX);
    }

    fn on_next(&self, item: u32) {
        black_box(item);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    fn on_error(&self, error: BraidError) {
        panic!("unexpected error: {error}");
    }

    fn on_complete(&self) {}
}

fn run(publisher: &SharedPublisher<u32>) -> u64 {
    let counting = Arc::new(Counting::default());
    publisher.subscribe(counting.clone());
    counting.count.load(Ordering::Relaxed)
}

pub fn bench_merge_interleaved(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_interleaved");
    let total = 100_000u32;

    // Same total volume spread over more sources
    for &sources in &[2u32, 16, 256] {
        for &batch in &[1usize, 32, 128] {
            group.throughput(Throughput::Elements(u64::from(total)));
            let id = BenchmarkId::from_parameter(format!("sources_{sources}_batch_{batch}"));
            group.bench_with_input(id, &(sources, batch), |bencher, &(sources, batch)| {
                let inner: Vec<SharedPublisher<u32>> = (0..sources)
                    .map(|i| source::range(i * total, total / sources))
                    .collect();
                let merged = merge_interleaved(source::from_iter(inner))
                    .max_concurrency(sources as usize)
                    .batch_size(batch)
                    .build()
                    .unwrap();
                bencher.iter(|| black_box(run(&merged)));
            });
        }
    }

    group.finish();
}

pub fn bench_flat_map_interleaved(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_map_interleaved");

    for &concurrency in &[1usize, 4, 64] {
        group.throughput(Throughput::Elements(10_000));
        let id = BenchmarkId::from_parameter(format!("single_item_sources_c{concurrency}"));
        group.bench_with_input(id, &concurrency, |bencher, &concurrency| {
            let merged =
                flat_map_interleaved(source::range(0, 10_000), source::just, concurrency).unwrap();
            bencher.iter(|| black_box(run(&merged)));
        });
    }

    group.finish();
}
