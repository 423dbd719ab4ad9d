use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use flurry::{Clock, Engine, FLURRY_EPOCH, ManualClock, MonotonicClock, Options, SystemClock};
use futures::future::try_join_all;
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};
use tokio::runtime::Builder;

// Number of IDs generated per benchmark iteration (split across threads or
// tasks for the contended variants).
const TOTAL_IDS: usize = 4096;

fn engine_with<C: Clock>(clock: C) -> Engine {
    Engine::with_clock(Options::new(FLURRY_EPOCH, 1), clock).unwrap()
}

/// Benchmarks one caller issuing IDs back to back.
fn bench_engine(c: &mut Criterion, group_name: &str, engine_factory: impl Fn() -> Engine) {
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        let engine = engine_factory();
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                for _ in 0..TOTAL_IDS {
                    black_box(engine.next_id());
                }
            }
            start.elapsed()
        });
        engine.stop().unwrap();
    });

    group.finish();
}

/// Benchmarks one engine shared by several threads.
fn bench_engine_contended(
    c: &mut Criterion,
    group_name: &str,
    engine_factory: impl Fn() -> Engine,
) {
    let mut group = c.benchmark_group(group_name);

    for thread_count in [1, 2, 4, 8, 16] {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(
            format!("elems/{TOTAL_IDS}/threads/{thread_count}"),
            |b| {
                let engine = engine_factory();
                b.iter_custom(|iters| {
                    let start = Instant::now();

                    for _ in 0..iters {
                        let barrier = Arc::new(Barrier::new(thread_count + 1));
                        scope(|s| {
                            for _ in 0..thread_count {
                                let engine = engine.clone();
                                let barrier = Arc::clone(&barrier);
                                s.spawn(move || {
                                    barrier.wait();
                                    for _ in 0..ids_per_thread {
                                        black_box(engine.next_id());
                                    }
                                });
                            }
                            barrier.wait();
                        });
                    }

                    start.elapsed()
                });
                engine.stop().unwrap();
            },
        );
    }

    group.finish();
}

/// Benchmarks one engine shared by many Tokio tasks.
fn bench_engine_async_tokio(
    c: &mut Criterion,
    group_name: &str,
    engine_factory: impl Fn() -> Engine,
) {
    let mut group = c.benchmark_group(group_name);

    for task_count in [1, 8, 64] {
        let ids_per_task = TOTAL_IDS / task_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(format!("elems/{TOTAL_IDS}/tasks/{task_count}"), |b| {
            let rt = Builder::new_multi_thread()
                .enable_all()
                .worker_threads(num_cpus::get())
                .build()
                .unwrap();
            let engine = engine_factory();

            b.to_async(&rt).iter_custom(|iters| {
                let engine = engine.clone();
                async move {
                    let start = Instant::now();

                    for _ in 0..iters {
                        let tasks = (0..task_count).map(|_| {
                            let engine = engine.clone();
                            tokio::spawn(async move {
                                for _ in 0..ids_per_task {
                                    black_box(engine.try_next_id_async().await?);
                                }
                                Ok::<_, flurry::Error>(())
                            })
                        });
                        for result in try_join_all(tasks).await.unwrap() {
                            result.unwrap();
                        }
                    }

                    start.elapsed()
                }
            });

            rt.block_on(engine.stop_async()).unwrap();
        });
    }

    group.finish();
}

fn benchmark_manual_sequential(c: &mut Criterion) {
    bench_engine(c, "manual/sequential", || engine_with(ManualClock::new(1)));
}

fn benchmark_system_sequential(c: &mut Criterion) {
    bench_engine(c, "system/sequential", || engine_with(SystemClock));
}

fn benchmark_mono_sequential(c: &mut Criterion) {
    bench_engine(c, "mono/sequential", || engine_with(MonotonicClock::new()));
}

fn benchmark_manual_contended(c: &mut Criterion) {
    bench_engine_contended(c, "manual/contended", || engine_with(ManualClock::new(1)));
}

fn benchmark_system_contended(c: &mut Criterion) {
    bench_engine_contended(c, "system/contended", || engine_with(SystemClock));
}

fn benchmark_system_tokio(c: &mut Criterion) {
    bench_engine_async_tokio(c, "system/tokio", || engine_with(SystemClock));
}

criterion_group!(
    benches,
    // Manual clock (sequence exhaustion costs no real time)
    benchmark_manual_sequential,
    benchmark_manual_contended,
    // Real clocks
    benchmark_system_sequential,
    benchmark_mono_sequential,
    benchmark_system_contended,
    // Async callers
    benchmark_system_tokio,
);
criterion_main!(benches);
