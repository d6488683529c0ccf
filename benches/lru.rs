use std::hint::black_box;
use std::sync::Arc;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use memlru::ds::IndexKind;
use memlru::policy::lru::LruCache;

const ENTRIES: u64 = 1024;
// key (8) + value (24)
const ENTRY_COST: usize = 32;

fn value(i: u64) -> Arc<[u8]> {
    Arc::from(&[i as u8; 24][..])
}

fn filled(index: IndexKind, batch: usize) -> LruCache<Arc<[u8]>> {
    let mut cache = LruCache::builder(ENTRIES as usize * ENTRY_COST)
        .index(index)
        .evict_batch_size(batch)
        .build();
    for i in 0..ENTRIES {
        cache.set(&i.to_le_bytes(), value(i));
    }
    cache
}

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_get_hit");
    group.throughput(Throughput::Elements(ENTRIES));
    for index in [IndexKind::Exact, IndexKind::Hashed] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{index:?}")),
            &index,
            |b, &index| {
                let mut cache = filled(index, 1);
                b.iter(|| {
                    for i in 0..ENTRIES {
                        let _ = black_box(cache.get(black_box(&i.to_le_bytes())));
                    }
                })
            },
        );
    }
    group.finish();
}

fn bench_set_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_set_update");
    group.throughput(Throughput::Elements(ENTRIES));
    for index in [IndexKind::Exact, IndexKind::Hashed] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{index:?}")),
            &index,
            |b, &index| {
                let mut cache = filled(index, 1);
                b.iter(|| {
                    for i in 0..ENTRIES {
                        cache.set(black_box(&i.to_le_bytes()), value(i + 1));
                    }
                })
            },
        );
    }
    group.finish();
}

fn bench_eviction_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_eviction_churn");
    group.throughput(Throughput::Elements(4 * ENTRIES));
    for batch in [1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::new("batch", batch), &batch, |b, &batch| {
            b.iter_batched(
                || filled(IndexKind::Exact, batch),
                |mut cache| {
                    for i in 0..4 * ENTRIES {
                        cache.set(black_box(&(10_000 + i).to_le_bytes()), value(i));
                    }
                    cache
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("lru_get_miss", |b| {
        let mut cache = filled(IndexKind::Exact, 1);
        b.iter(|| {
            for i in ENTRIES..2 * ENTRIES {
                let _ = black_box(cache.get(black_box(&i.to_le_bytes())));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_get_hit,
    bench_set_update,
    bench_eviction_churn,
    bench_get_miss
);
criterion_main!(benches);
