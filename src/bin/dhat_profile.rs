//! DHAT heap profiler for memlru.
//!
//! Run with: cargo run --bin dhat_profile --release --features dhat-heap
//! View results: Open dhat-heap.json in <https://nnethercote.github.io/dh_view/dh_view.html>
//!
//! Set `RUST_LOG=memlru=debug` to see construction and refusal events.

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use memlru::builder::CacheBuilder;
use memlru::ds::IndexKind;
use memlru::policy::lru::LruCache;
use memlru::policy::sharded::ShardedLruCache;
use tracing_subscriber::EnvFilter;

/// Simple XorShift64 RNG for deterministic workloads.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (u64::MAX as f64);
        (self.next_u64() as f64) * SCALE
    }
}

const BUDGET: usize = 1 << 20;
const OPERATIONS: usize = 100_000;
const UNIVERSE: u64 = 16_384;

type Value = Vec<u8>;

/// Variable-size payload so the budget, not a count, bounds the cache.
fn payload(key: u64) -> Value {
    vec![key as u8; 32 + (key % 97) as usize]
}

/// Hot set: 90% of accesses hit 10% of keys; misses fill.
fn hotset_workload(cache: &mut LruCache<Value>, seed: u64) {
    let mut rng = XorShift64::new(seed);
    let hot = UNIVERSE / 10;

    for _ in 0..OPERATIONS {
        let key = if rng.next_f64() < 0.9 {
            rng.next_u64() % hot
        } else {
            hot + rng.next_u64() % (UNIVERSE - hot)
        };
        let bytes = key.to_le_bytes();
        if cache.get(&bytes).is_none() {
            cache.set(&bytes, payload(key));
        }
    }
}

/// Sequential scan over the whole universe.
fn scan_workload(cache: &mut LruCache<Value>) {
    for i in 0..OPERATIONS as u64 / 2 {
        let key = i % UNIVERSE;
        let bytes = key.to_le_bytes();
        if cache.get(&bytes).is_none() {
            cache.set(&bytes, payload(key));
        }
    }
}

/// Unique keys only: every insert past the budget evicts.
fn eviction_churn(cache: &mut LruCache<Value>) {
    for i in 0..OPERATIONS as u64 / 4 {
        let key = UNIVERSE + i;
        cache.set(&key.to_le_bytes(), payload(key));
    }
}

fn profile_single(label: &str, mut cache: LruCache<Value>) {
    println!("=== Profiling {label} ===");

    hotset_workload(&mut cache, 42);
    scan_workload(&mut cache);
    eviction_churn(&mut cache);

    println!(
        "  Final size: {} entries, cost {} / {}",
        cache.len(),
        cache.current_cost(),
        cache.max_cost()
    );
}

fn profile_sharded() {
    println!("=== Profiling sharded (8 shards) ===");
    let cache: ShardedLruCache<Value> = ShardedLruCache::new(8, BUDGET);
    let mut rng = XorShift64::new(7);

    for _ in 0..OPERATIONS {
        let key = rng.next_u64() % UNIVERSE;
        let bytes = key.to_le_bytes();
        if cache.get(&bytes).is_none() {
            cache.set(&bytes, payload(key));
        }
    }

    println!(
        "  Final size: {} entries, cost {} / {}",
        cache.len(),
        cache.current_cost(),
        cache.max_cost()
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let _profiler = dhat::Profiler::new_heap();

    println!("memlru DHAT Heap Profiling");
    println!("==========================\n");

    profile_single("LRU (exact index)", LruCache::new(BUDGET));
    profile_single(
        "LRU (hashed index, batch 16)",
        CacheBuilder::new(BUDGET)
            .index(IndexKind::Hashed)
            .evict_batch_size(16)
            .build(),
    );
    profile_sharded();

    println!("\n==========================");
    println!("Profile written to dhat-heap.json");
}
