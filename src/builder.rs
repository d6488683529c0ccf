//! Builder for every cache flavour in the crate.
//!
//! One set of knobs (budget, eviction batch, cost function, hash function,
//! index layout, shard count) and three terminal methods:
//!
//! | Terminal            | Produces                 |
//! |---------------------|--------------------------|
//! | `build()`           | [`LruCache`]             |
//! | `build_concurrent()`| [`ConcurrentLruCache`]   |
//! | `build_sharded()`   | [`ShardedLruCache`]      |
//!
//! Each has a `try_` twin that returns [`ConfigError`] instead of panicking.
//!
//! ## Example
//!
//! ```rust
//! use memlru::builder::CacheBuilder;
//! use memlru::ds::IndexKind;
//!
//! let mut cache = CacheBuilder::<Vec<u8>>::new(1024)
//!     .evict_batch_size(8)
//!     .index(IndexKind::Hashed)
//!     .build();
//! cache.set(b"k", b"hello".to_vec());
//! assert_eq!(cache.get(b"k"), Some(&b"hello".to_vec()));
//!
//! // Values without a `Weigh` impl supply their own cost.
//! let sharded = CacheBuilder::with_cost_fn(64, |_: &[u8], _: &u32| 1)
//!     .shards(4)
//!     .build_sharded();
//! sharded.set(b"n", 7);
//! assert_eq!(sharded.current_cost(), 1);
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::ds::key_index::{IndexKind, KeyIndex};
use crate::ds::shard::{HashFn, ShardSelector, default_hash_fn};
use crate::error::ConfigError;
use crate::policy::budget::{CostBudget, CostFn, default_cost};
use crate::policy::lru::{ConcurrentLruCache, LruCache};
use crate::policy::sharded::ShardedLruCache;
use crate::traits::Weigh;

/// Configures and creates caches. See the [module docs](self).
pub struct CacheBuilder<V> {
    max_cost: usize,
    evict_batch_size: usize,
    cost_fn: CostFn<V>,
    hash_fn: HashFn,
    index: IndexKind,
    shards: usize,
}

impl<V: Weigh + 'static> CacheBuilder<V> {
    /// Starts a builder that charges `key.len() + value.weight()` per entry.
    ///
    /// For sharded caches `max_cost` is the total, split evenly per shard.
    pub fn new(max_cost: usize) -> Self {
        Self::with_cost_fn(max_cost, default_cost::<V>)
    }
}

impl<V> CacheBuilder<V> {
    /// Starts a builder with a custom cost function.
    pub fn with_cost_fn(
        max_cost: usize,
        cost_fn: impl Fn(&[u8], &V) -> usize + Send + Sync + 'static,
    ) -> Self {
        Self {
            max_cost,
            evict_batch_size: 1,
            cost_fn: Arc::new(cost_fn),
            hash_fn: default_hash_fn(),
            index: IndexKind::default(),
            shards: 1,
        }
    }

    /// Entries evicted per batch when room is needed. Defaults to 1.
    pub fn evict_batch_size(mut self, evict_batch_size: usize) -> Self {
        self.evict_batch_size = evict_batch_size;
        self
    }

    /// Replaces the cost function.
    pub fn cost_fn(mut self, cost_fn: impl Fn(&[u8], &V) -> usize + Send + Sync + 'static) -> Self {
        self.cost_fn = Arc::new(cost_fn);
        self
    }

    /// Replaces the key hash used by the hashed index and the shard router.
    pub fn hash_fn(mut self, hash_fn: impl Fn(&[u8]) -> u64 + Send + Sync + 'static) -> Self {
        self.hash_fn = Arc::new(hash_fn);
        self
    }

    /// Index layout. Defaults to [`IndexKind::Exact`].
    pub fn index(mut self, index: IndexKind) -> Self {
        self.index = index;
        self
    }

    /// Shard count, used by [`build_sharded`](Self::build_sharded) only.
    /// Defaults to 1.
    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    fn assemble<W>(&self, max_cost: usize, cost_fn: CostFn<W>) -> Result<LruCache<W>, ConfigError> {
        let budget = CostBudget::try_new(max_cost, self.evict_batch_size)?;
        let index = KeyIndex::new(self.index, Arc::clone(&self.hash_fn));
        Ok(LruCache::from_parts(budget, cost_fn, index))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroMaxCost`] or [`ConfigError::ZeroEvictBatch`].
    pub fn try_build(self) -> Result<LruCache<V>, ConfigError> {
        let cache = self.assemble(self.max_cost, Arc::clone(&self.cost_fn))?;
        debug!(
            max_cost = self.max_cost,
            evict_batch_size = self.evict_batch_size,
            index = ?self.index,
            "built lru cache"
        );
        Ok(cache)
    }

    /// # Panics
    ///
    /// Panics on an invalid configuration; see [`try_build`](Self::try_build).
    pub fn build(self) -> LruCache<V> {
        match self.try_build() {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<V: 'static> CacheBuilder<V> {
    /// The thread-safe engines store `Arc<V>`; charge them through the
    /// configured cost function.
    fn shared_cost_fn(&self) -> CostFn<Arc<V>> {
        let cost_fn = Arc::clone(&self.cost_fn);
        Arc::new(move |key: &[u8], value: &Arc<V>| cost_fn(key, &**value))
    }

    /// # Errors
    ///
    /// Same as [`try_build`](Self::try_build).
    pub fn try_build_concurrent(self) -> Result<ConcurrentLruCache<V>, ConfigError> {
        let cache = self.assemble(self.max_cost, self.shared_cost_fn())?;
        debug!(
            max_cost = self.max_cost,
            evict_batch_size = self.evict_batch_size,
            index = ?self.index,
            "built concurrent lru cache"
        );
        Ok(ConcurrentLruCache::from_cache(cache))
    }

    /// # Panics
    ///
    /// Panics on an invalid configuration.
    pub fn build_concurrent(self) -> ConcurrentLruCache<V> {
        match self.try_build_concurrent() {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ShardCount`] unless the shard count is a
    /// non-zero power of two, [`ConfigError::ZeroMaxCost`] for a zero total,
    /// [`ConfigError::ShardBudget`] if `max_cost / shards` is zero, and
    /// [`ConfigError::ZeroEvictBatch`] for a zero batch size.
    pub fn try_build_sharded(self) -> Result<ShardedLruCache<V>, ConfigError> {
        let selector = ShardSelector::try_with_hash(self.shards, Arc::clone(&self.hash_fn))?;
        if self.max_cost == 0 {
            return Err(ConfigError::ZeroMaxCost);
        }
        let per_shard = self.max_cost / self.shards;
        if per_shard == 0 {
            return Err(ConfigError::ShardBudget {
                total: self.max_cost,
                shards: self.shards,
            });
        }

        let cost_fn = self.shared_cost_fn();
        let shards = (0..self.shards)
            .map(|_| {
                self.assemble(per_shard, Arc::clone(&cost_fn))
                    .map(ConcurrentLruCache::from_cache)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            shards = self.shards,
            total_cost = self.max_cost,
            per_shard_cost = per_shard,
            unallocated = self.max_cost % self.shards,
            evict_batch_size = self.evict_batch_size,
            index = ?self.index,
            "built sharded lru cache"
        );
        Ok(ShardedLruCache::from_shards(shards, selector))
    }

    /// # Panics
    ///
    /// Panics on an invalid configuration; see
    /// [`try_build_sharded`](Self::try_build_sharded).
    pub fn build_sharded(self) -> ShardedLruCache<V> {
        match self.try_build_sharded() {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<V> fmt::Debug for CacheBuilder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("max_cost", &self.max_cost)
            .field("evict_batch_size", &self.evict_batch_size)
            .field("index", &self.index)
            .field("shards", &self.shards)
            .finish_non_exhaustive()
    }
}
