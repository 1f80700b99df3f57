use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::time::Instant;
use workgate::{ChunkWorker, Executor};

// Number of operations submitted per benchmark iteration.
const TOTAL_OPS: usize = 4096;
// Number of elements fed per chunk benchmark iteration.
const TOTAL_ELEMS: usize = 1 << 16;

type IoResult = Result<(), std::io::Error>;

/// Benchmarks submit + wait for trivial operations.
fn bench_executor(c: &mut Criterion, group_name: &str, fan_out: bool) {
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_OPS as u64));

    for queue_size in [1, 4, num_cpus::get()] {
        group.bench_function(format!("ops/{TOTAL_OPS}/queue/{queue_size}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    let executor = Executor::builder()
                        .queue_size(queue_size)
                        .fan_out(fan_out)
                        .build()
                        .unwrap();
                    for i in 0..TOTAL_OPS {
                        executor.submit(move || -> IoResult {
                            black_box(i);
                            Ok(())
                        });
                    }
                    executor.wait().unwrap();
                }
                start.elapsed()
            });
        });
    }

    group.finish();
}

/// Benchmarks feeding small batches into a chunk worker.
fn bench_chunk_worker(c: &mut Criterion, group_name: &str, fan_out: bool) {
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_ELEMS as u64));

    for chunk_size in [64, 1024, 8192] {
        group.bench_function(format!("elems/{TOTAL_ELEMS}/chunk/{chunk_size}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    let worker = ChunkWorker::builder()
                        .chunk_size(chunk_size)
                        .queue_size(4)
                        .fan_out(fan_out)
                        .func(|chunk: Vec<u64>| -> IoResult {
                            black_box(chunk.iter().sum::<u64>());
                            Ok(())
                        })
                        .build()
                        .unwrap();
                    for batch in (0..TOTAL_ELEMS as u64).collect::<Vec<_>>().chunks(100) {
                        worker.feed(batch.to_vec());
                    }
                    worker.wait().unwrap();
                }
                start.elapsed()
            });
        });
    }

    group.finish();
}

fn benchmark_executor_serialized(c: &mut Criterion) {
    bench_executor(c, "executor/serialized", false);
}

fn benchmark_executor_fan_out(c: &mut Criterion) {
    bench_executor(c, "executor/fan_out", true);
}

fn benchmark_chunk_serialized(c: &mut Criterion) {
    bench_chunk_worker(c, "chunk/serialized", false);
}

fn benchmark_chunk_fan_out(c: &mut Criterion) {
    bench_chunk_worker(c, "chunk/fan_out", true);
}

criterion_group!(
    benches,
    benchmark_executor_serialized,
    benchmark_executor_fan_out,
    benchmark_chunk_serialized,
    benchmark_chunk_fan_out,
);
criterion_main!(benches);
