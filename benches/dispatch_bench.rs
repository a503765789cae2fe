//! Benchmarks for the throttled dispatcher.
//!
//! Benchmarks cover:
//! - Admission queue push/pop
//! - Rate limiter clearance checks against a full and an empty window
//! - End-to-end submit/settle throughput when neither bound is the bottleneck

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::time::Duration;

use throttled_dispatch::core::{AdmissionQueue, DispatchLimits, Dispatcher, RateLimiter};
use tokio::runtime::Runtime;
use tokio::time::Instant;

// ============================================================================
// Queue Benchmarks
// ============================================================================

fn bench_queue_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_push_pop");

    for size in [100_u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let q = AdmissionQueue::new();
                for i in 0..size {
                    let _ = q.push(i);
                }
                while let Some(entry) = q.try_pop() {
                    black_box(entry);
                }
            });
        });
    }
    group.finish();
}

// ============================================================================
// Rate Limiter Benchmarks
// ============================================================================

fn bench_limiter_try_acquire(c: &mut Criterion) {
    let mut group = c.benchmark_group("limiter_try_acquire");
    let rt = Runtime::new().unwrap();
    let _guard = rt.enter();

    for budget in [10_u32, 1_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("full_window", budget), &budget, |b, &budget| {
            let limiter = RateLimiter::new(budget, Duration::from_secs(3600)).unwrap();
            let now = Instant::now();
            for _ in 0..budget {
                let _ = limiter.try_acquire(now);
            }
            b.iter(|| black_box(limiter.try_acquire(now)));
        });

        group.bench_with_input(BenchmarkId::new("sliding", budget), &budget, |b, &budget| {
            let limiter = RateLimiter::new(budget, Duration::from_millis(1)).unwrap();
            let mut now = Instant::now();
            b.iter(|| {
                now += Duration::from_micros(10);
                black_box(limiter.try_acquire(now))
            });
        });
    }
    group.finish();
}

// ============================================================================
// Dispatcher Benchmarks
// ============================================================================

fn bench_submit_and_settle(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_and_settle");

    for tasks in [10_u64, 100, 1_000] {
        group.throughput(Throughput::Elements(tasks));
        group.bench_with_input(BenchmarkId::from_parameter(tasks), &tasks, |b, &tasks| {
            b.to_async(Runtime::new().unwrap()).iter(|| async move {
                let dispatcher = Dispatcher::new(DispatchLimits::new(64, u32::MAX)).unwrap();
                let handles: Vec<_> = (0..tasks)
                    .map(|i| dispatcher.submit(move || async move { Ok::<_, ()>(i * 2) }))
                    .collect();
                for handle in handles {
                    black_box(handle.await.unwrap());
                }
            });
        });
    }
    group.finish();
}

criterion_group!(queue_benches, bench_queue_push_pop);
criterion_group!(limiter_benches, bench_limiter_try_acquire);
criterion_group!(dispatch_benches, bench_submit_and_settle);
criterion_main!(queue_benches, limiter_benches, dispatch_benches);
