use std::hint::black_box;
use std::thread;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use memlru::policy::lru::ConcurrentLruCache;
use memlru::policy::sharded::ShardedLruCache;
use memlru::traits::ConcurrentCache;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const UNIVERSE: u64 = 16_384;
const BUDGET: usize = 256 * 1024;
const OPS_PER_THREAD: u64 = 10_000;
const THREADS: u64 = 4;

/// 80% reads, 20% writes over a uniform key universe.
fn mixed_workload<C: ConcurrentCache<Vec<u8>>>(cache: &C, seed: u64) {
    let mut rng = SmallRng::seed_from_u64(seed);
    for _ in 0..OPS_PER_THREAD {
        let key = rng.random_range(0..UNIVERSE).to_le_bytes();
        if rng.random_range(0..10) < 8 {
            let _ = black_box(cache.get(&key));
        } else {
            cache.set(&key, vec![0u8; 24]);
        }
    }
}

fn run_threads<C: ConcurrentCache<Vec<u8>>>(cache: &C) {
    thread::scope(|scope| {
        for t in 0..THREADS {
            scope.spawn(move || mixed_workload(cache, t + 1));
        }
    });
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_mixed");
    group.throughput(Throughput::Elements(THREADS * OPS_PER_THREAD));

    group.bench_function("single_lock", |b| {
        let cache: ConcurrentLruCache<Vec<u8>> = ConcurrentLruCache::new(BUDGET);
        b.iter(|| run_threads(&cache))
    });

    for shards in [4usize, 16, 64] {
        group.bench_with_input(BenchmarkId::new("sharded", shards), &shards, |b, &shards| {
            let cache: ShardedLruCache<Vec<u8>> = ShardedLruCache::new(shards, BUDGET);
            b.iter(|| run_threads(&cache))
        });
    }
    group.finish();
}

fn bench_shard_routing(c: &mut Criterion) {
    let cache: ShardedLruCache<Vec<u8>> = ShardedLruCache::new(16, BUDGET);
    c.bench_function("sharded_route_key", |b| {
        b.iter(|| {
            for i in 0..1024u64 {
                let _ = black_box(cache.shard_for_key(black_box(&i.to_le_bytes())));
            }
        })
    });
}

criterion_group!(benches, bench_contention, bench_shard_routing);
criterion_main!(benches);
