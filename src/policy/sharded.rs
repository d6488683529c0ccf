//! # Sharded LRU Cache
//!
//! Splits one cost budget across a power-of-two number of independent
//! [`ConcurrentLruCache`] shards, each behind its own lock.
//!
//! ```text
//!   set(key, value)
//!        │
//!        ▼
//!   ShardSelector: hash(key) & (shards - 1)
//!        │
//!        ▼
//!   ┌──────────────┬──────────────┬──────────────┬──────────────┐
//!   │   shard 0    │   shard 1    │   shard 2    │   shard 3    │
//!   │ RwLock + LRU │ RwLock + LRU │ RwLock + LRU │ RwLock + LRU │
//!   │ max = T / 4  │ max = T / 4  │ max = T / 4  │ max = T / 4  │
//!   └──────────────┴──────────────┴──────────────┴──────────────┘
//! ```
//!
//! Every shard gets `total_cost / shards` (integer division; any remainder
//! goes unused). Recency and eviction are strictly per shard, so an entry can
//! be evicted while another shard still has room; the global picture is only
//! approximately LRU.
//!
//! `current_cost` sums the shards' lock-free cost mirrors. Under concurrent
//! writes the sum is a best-effort figure, exact once writers are quiet.
//!
//! ## Example
//!
//! ```
//! use memlru::policy::sharded::ShardedLruCache;
//!
//! let cache: ShardedLruCache<Vec<u8>> = ShardedLruCache::new(4, 4096);
//! assert_eq!(cache.shard_count(), 4);
//! assert_eq!(cache.max_cost(), 4096);
//!
//! cache.set(b"user:1", b"alice".to_vec());
//! assert_eq!(cache.get(b"user:1").as_deref(), Some(&b"alice".to_vec()));
//! assert_eq!(cache.current_cost(), 11);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::builder::CacheBuilder;
use crate::ds::shard::ShardSelector;
use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::CacheMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::MetricsSnapshotProvider;
use crate::policy::lru::ConcurrentLruCache;
use crate::traits::{ConcurrentCache, Weigh};

/// Byte-keyed cache partitioned into independently locked LRU shards.
pub struct ShardedLruCache<V> {
    shards: Box<[ConcurrentLruCache<V>]>,
    selector: ShardSelector,
}

impl<V: Weigh + 'static> ShardedLruCache<V> {
    /// Creates `shard_count` shards sharing `total_cost`.
    ///
    /// # Panics
    ///
    /// Panics if `shard_count` is not a non-zero power of two or if
    /// `total_cost / shard_count` is zero. For a non-panicking alternative,
    /// use [`try_new`](Self::try_new).
    pub fn new(shard_count: usize, total_cost: usize) -> Self {
        match Self::try_new(shard_count, total_cost) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ShardCount`] for a bad shard count and
    /// [`ConfigError::ShardBudget`] when the per-shard budget rounds to zero.
    pub fn try_new(shard_count: usize, total_cost: usize) -> Result<Self, ConfigError> {
        CacheBuilder::new(total_cost)
            .shards(shard_count)
            .try_build_sharded()
    }

    pub fn builder(total_cost: usize) -> CacheBuilder<V> {
        CacheBuilder::new(total_cost)
    }
}

impl<V> ShardedLruCache<V> {
    pub(crate) fn from_shards(shards: Vec<ConcurrentLruCache<V>>, selector: ShardSelector) -> Self {
        debug_assert_eq!(shards.len(), selector.shard_count());
        Self {
            shards: shards.into_boxed_slice(),
            selector,
        }
    }

    #[inline]
    fn shard_of(&self, key: &[u8]) -> &ConcurrentLruCache<V> {
        &self.shards[self.selector.shard_for_key(key)]
    }

    /// Returns the shared value for `key` and marks it most recently used
    /// within its shard.
    pub fn get(&self, key: &[u8]) -> Option<Arc<V>> {
        self.shard_of(key).get(key)
    }

    pub fn get_with_hits(&self, key: &[u8]) -> Option<(Arc<V>, u32)> {
        self.shard_of(key).get_with_hits(key)
    }

    pub fn peek(&self, key: &[u8]) -> Option<Arc<V>> {
        self.shard_of(key).peek(key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.shard_of(key).contains(key)
    }

    /// Inserts or replaces the value in the key's shard. Entries larger than
    /// one shard's budget are refused.
    pub fn set(&self, key: &[u8], value: V) {
        self.shard_of(key).set(key, value);
    }

    pub fn set_arc(&self, key: &[u8], value: Arc<V>) {
        self.shard_of(key).set_arc(key, value);
    }

    pub fn delete(&self, key: &[u8]) -> Option<Arc<V>> {
        self.shard_of(key).delete(key)
    }

    /// Clears shards one at a time; concurrent writers may repopulate
    /// shards already cleared.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.clear();
        }
    }

    /// Sum of every shard's cost.
    pub fn current_cost(&self) -> usize {
        self.shards.iter().map(ConcurrentLruCache::current_cost).sum()
    }

    /// Sum of the per-shard budgets; at most the configured total.
    pub fn max_cost(&self) -> usize {
        self.shards.iter().map(ConcurrentLruCache::max_cost).sum()
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(ConcurrentLruCache::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(ConcurrentLruCache::is_empty)
    }

    #[inline]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard that owns `key`.
    #[inline]
    pub fn shard_for_key(&self, key: &[u8]) -> usize {
        self.selector.shard_for_key(key)
    }

    /// Direct access to one shard.
    pub fn shard(&self, index: usize) -> Option<&ConcurrentLruCache<V>> {
        self.shards.get(index)
    }

    /// Checks every shard, naming the first one that fails.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        for (i, shard) in self.shards.iter().enumerate() {
            shard
                .check_invariants()
                .map_err(|e| InvariantError::new(format!("shard {i}: {}", e.message())))?;
        }
        Ok(())
    }

    /// Merged counters and gauges of all shards.
    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        self.shards
            .iter()
            .map(ConcurrentLruCache::metrics_snapshot)
            .fold(CacheMetricsSnapshot::default(), CacheMetricsSnapshot::merge)
    }
}

#[cfg(feature = "metrics")]
impl<V> MetricsSnapshotProvider<CacheMetricsSnapshot> for ShardedLruCache<V> {
    fn snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<V> fmt::Debug for ShardedLruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedLruCache")
            .field("shards", &self.shard_count())
            .field("current_cost", &self.current_cost())
            .field("max_cost", &self.max_cost())
            .finish_non_exhaustive()
    }
}

impl<V> ConcurrentCache<V> for ShardedLruCache<V>
where
    V: Send + Sync,
{
    fn get(&self, key: &[u8]) -> Option<Arc<V>> {
        ShardedLruCache::get(self, key)
    }

    fn set(&self, key: &[u8], value: V) {
        ShardedLruCache::set(self, key, value);
    }

    fn delete(&self, key: &[u8]) -> Option<Arc<V>> {
        ShardedLruCache::delete(self, key)
    }

    fn current_cost(&self) -> usize {
        ShardedLruCache::current_cost(self)
    }

    fn max_cost(&self) -> usize {
        ShardedLruCache::max_cost(self)
    }

    fn len(&self) -> usize {
        ShardedLruCache::len(self)
    }
}
