//! Benchmark: shard contention under different blow-up factors
//!
//! Measures per-key inserts against locality-sorted batches, and the locked
//! and lock-free reductions, on the global rayon pool.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use shardlock::ShardedSet;

const SIZES: &[usize] = &[10_000, 100_000];
const BLOW_UP_FACTORS: &[usize] = &[1, 10, 100];

fn keys(n: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(0);
    (0..n).map(|_| rng.random()).collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    group.sample_size(20);
    let workers = shardlock::pool::worker_count();

    for &size in SIZES {
        let data = keys(size);
        group.throughput(Throughput::Elements(size as u64));

        for &blow_up in BLOW_UP_FACTORS {
            let label = format!("{}x{}", size, blow_up);

            group.bench_with_input(BenchmarkId::new("per_key", &label), &data, |b, data| {
                b.iter(|| {
                    let set = ShardedSet::with_blow_up(workers, blow_up);
                    data.par_iter().for_each(|k| {
                        set.insert(black_box(*k));
                    });
                    set
                });
            });

            group.bench_with_input(BenchmarkId::new("batched", &label), &data, |b, data| {
                b.iter(|| {
                    let set = ShardedSet::with_blow_up(workers, blow_up);
                    let mut batch = data.clone();
                    set.insert_batch(black_box(&mut batch));
                    set
                });
            });
        }
    }

    group.finish();
}

fn bench_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum");
    let workers = shardlock::pool::worker_count();

    for &size in SIZES {
        let mut set = ShardedSet::new(workers);
        set.insert_batch(&mut keys(size));
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(BenchmarkId::new("locked", size), |b| {
            b.iter(|| black_box(set.sum()));
        });
        group.bench_function(BenchmarkId::new("no_lock", size), |b| {
            b.iter(|| black_box(set.sum_no_lock()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_sum);
criterion_main!(benches);
