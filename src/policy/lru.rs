//! # Cost-Bounded LRU Cache
//!
//! Byte-keyed cache that keeps the aggregate cost of its entries under a
//! fixed budget, evicting least recently used entries in batches.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                        ConcurrentLruCache<V>                             │
//!   │                                                                          │
//!   │   RwLock<LruCache<V>>                 AtomicUsize (cost mirror)          │
//!   │          │                                                               │
//!   │          ▼                                                               │
//!   │   ┌────────────────────────────────────────────────────────────────────┐ │
//!   │   │                         LruCache<V>                                │ │
//!   │   │                                                                    │ │
//!   │   │   ┌──────────────────────────────────────────────────────────────┐ │ │
//!   │   │   │  KeyIndex (Exact: key bytes │ Hashed: fingerprint + verify)  │ │ │
//!   │   │   │    "user:1" ──► id_7    "user:2" ──► id_3                    │ │ │
//!   │   │   └──────────────────────────────────┬───────────────────────────┘ │ │
//!   │   │                                      ▼                             │ │
//!   │   │   ┌──────────────────────────────────────────────────────────────┐ │ │
//!   │   │   │  IntrusiveList<Entry<V>>                                     │ │ │
//!   │   │   │                                                              │ │ │
//!   │   │   │  head ──► ┌──────┐ ◄──► ┌──────┐ ◄──► ┌──────┐ ◄── tail      │ │ │
//!   │   │   │    (MRU)  │ key  │      │ key  │      │ key  │   (LRU)       │ │ │
//!   │   │   │           │ value│      │ value│      │ value│               │ │ │
//!   │   │   │           │ cost │      │ cost │      │ cost │               │ │ │
//!   │   │   │           └──────┘      └──────┘      └──────┘               │ │ │
//!   │   │   └──────────────────────────────────────────────────────────────┘ │ │
//!   │   │                                                                    │ │
//!   │   │   CostBudget { max_cost, current_cost, evict_batch_size }          │ │
//!   │   │   CostFn: (key, value) → cost                                      │ │
//!   │   └────────────────────────────────────────────────────────────────────┘ │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Set Flow
//!
//! ```text
//!   set(key, value):
//!     cost = cost_fn(key, value)
//!
//!     cost > max_cost? ──► refuse, cache unchanged (an old value stays put)
//!
//!     key present?
//!       ├─ yes, current - old + cost <= max ──► replace in place, move to MRU
//!       └─ yes, no room in place ─────────────► remove old, continue as new
//!
//!     while current + cost > max_cost: evict one batch from the tail
//!     push to MRU, index, charge cost
//! ```
//!
//! ## Methods
//!
//! | Method              | Complexity | Description                              |
//! |---------------------|------------|------------------------------------------|
//! | `get(key)`          | O(1)       | Value by reference, moves entry to MRU   |
//! | `get_with_hits(key)`| O(1)       | Same, plus the entry's hit counter       |
//! | `peek(key)`         | O(1)       | Value without touching recency           |
//! | `set(key, value)`   | O(1)*      | Insert or replace, may evict             |
//! | `delete(key)`       | O(1)       | Remove and return the value              |
//! | `current_cost()`    | O(1)       | Aggregate cost of live entries           |
//! | `iter()`            | O(n)       | Entries from MRU to LRU                  |
//! | `check_invariants()`| O(n)       | Cross-checks list, index and budget      |
//!
//! `*` amortized over the evictions the insert triggers.
//!
//! ## Thread Safety
//!
//! - `LruCache`: single-threaded; `get` takes `&mut self`.
//! - `ConcurrentLruCache`: `parking_lot::RwLock`. `get`, `set`, `delete` take
//!   the write lock (recency changes); `peek`, `contains`, `len` take the
//!   read lock. `current_cost` reads an atomic mirror and takes no lock.
//!
//! ## Example Usage
//!
//! ```
//! use memlru::policy::lru::LruCache;
//!
//! let mut cache: LruCache<Vec<u8>> = LruCache::new(16);
//! cache.set(b"a", vec![0; 5]); // cost 6
//! cache.set(b"b", vec![0; 5]); // cost 6
//! assert_eq!(cache.current_cost(), 12);
//!
//! cache.get(b"a");             // "b" is now least recently used
//! cache.set(b"c", vec![0; 5]); // needs room: evicts "b"
//!
//! assert!(cache.contains(b"a"));
//! assert!(!cache.contains(b"b"));
//! assert_eq!(cache.current_cost(), 12);
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::builder::CacheBuilder;
use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::key_index::{IndexKind, KeyIndex};
use crate::ds::slot_arena::SlotId;
use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::LruMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::CacheMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{CoreMetricsRecorder, CostMetricsRecorder, MetricsSnapshotProvider};
use crate::policy::budget::{CostBudget, CostFn, EvictLru, EvictionReport};
use crate::traits::{ConcurrentCache, Weigh};

/// One cached entry. The exact index shares `key`; the hashed index only
/// reads it to verify fingerprint matches.
#[derive(Debug)]
struct Entry<V> {
    key: Arc<[u8]>,
    value: V,
    cost: usize,
    hits: u32,
}

/// Recency list and key index, kept in lockstep.
#[derive(Debug)]
struct EntryTable<V> {
    list: IntrusiveList<Entry<V>>,
    index: KeyIndex,
}

impl<V> EntryTable<V> {
    fn new(index: KeyIndex) -> Self {
        Self {
            list: IntrusiveList::new(),
            index,
        }
    }

    #[inline]
    fn find(&self, key: &[u8]) -> Option<SlotId> {
        let list = &self.list;
        self.index
            .lookup(key, |id| list.get(id).is_some_and(|entry| *entry.key == *key))
    }

    fn insert_front(&mut self, entry: Entry<V>) -> SlotId {
        let key = Arc::clone(&entry.key);
        let id = self.list.push_front(entry);
        self.index.insert(&key, id);
        id
    }

    fn remove(&mut self, id: SlotId) -> Option<Entry<V>> {
        let entry = self.list.remove(id)?;
        self.index.remove(&entry.key, id);
        Some(entry)
    }

    fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
    }
}

impl<V> EvictLru for EntryTable<V> {
    fn evict_lru(&mut self) -> Option<usize> {
        let (id, entry) = self.list.pop_back()?;
        self.index.remove(&entry.key, id);
        Some(entry.cost)
    }
}

/// Single-threaded cost-bounded LRU cache.
///
/// Build one with [`new`](Self::new) for defaults or through
/// [`builder`](Self::builder) to pick the batch size, cost function, hash
/// function and index layout.
///
/// # Example
///
/// ```
/// use memlru::policy::lru::LruCache;
///
/// let mut cache: LruCache<String> = LruCache::builder(64)
///     .evict_batch_size(4)
///     .build();
/// cache.set(b"greeting", "hello".to_string());
/// assert_eq!(cache.get(b"greeting").map(String::as_str), Some("hello"));
/// assert_eq!(cache.current_cost(), 13);
/// ```
pub struct LruCache<V> {
    table: EntryTable<V>,
    budget: CostBudget,
    cost_fn: CostFn<V>,
    #[cfg(feature = "metrics")]
    metrics: LruMetrics,
}

impl<V: Weigh + 'static> LruCache<V> {
    /// Creates a cache with the default cost function, an exact index and
    /// unit eviction batches.
    ///
    /// # Panics
    ///
    /// Panics if `max_cost` is zero. For a non-panicking alternative, use
    /// [`try_new`](Self::try_new).
    pub fn new(max_cost: usize) -> Self {
        match Self::try_new(max_cost) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Fallible counterpart of [`new`](Self::new).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroMaxCost`] if `max_cost` is zero.
    pub fn try_new(max_cost: usize) -> Result<Self, ConfigError> {
        CacheBuilder::new(max_cost).try_build()
    }

    /// Starts a [`CacheBuilder`] with the default cost function.
    pub fn builder(max_cost: usize) -> CacheBuilder<V> {
        CacheBuilder::new(max_cost)
    }
}

impl<V> LruCache<V> {
    pub(crate) fn from_parts(budget: CostBudget, cost_fn: CostFn<V>, index: KeyIndex) -> Self {
        Self {
            table: EntryTable::new(index),
            budget,
            cost_fn,
            #[cfg(feature = "metrics")]
            metrics: LruMetrics::default(),
        }
    }

    /// Returns the value for `key` and marks it most recently used.
    #[inline]
    pub fn get(&mut self, key: &[u8]) -> Option<&V> {
        self.get_with_hits(key).map(|(value, _)| value)
    }

    /// Like [`get`](Self::get), also returning how many times the entry has
    /// been read since it was inserted (including this read).
    ///
    /// The counter saturates at `u32::MAX`, survives updates of the same key
    /// and restarts when a key is inserted again after leaving the cache.
    ///
    /// ```
    /// use memlru::policy::lru::LruCache;
    ///
    /// let mut cache: LruCache<Vec<u8>> = LruCache::new(100);
    /// cache.set(b"k", b"v".to_vec());
    /// cache.get(b"k");
    /// assert_eq!(cache.get_with_hits(b"k").map(|(_, hits)| hits), Some(2));
    /// ```
    pub fn get_with_hits(&mut self, key: &[u8]) -> Option<(&V, u32)> {
        let Some(id) = self.table.find(key) else {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_miss();
            return None;
        };
        #[cfg(feature = "metrics")]
        self.metrics.record_get_hit();

        self.table.list.move_to_front(id);
        let entry = self.table.list.get_mut(id)?;
        entry.hits = entry.hits.saturating_add(1);
        Some((&entry.value, entry.hits))
    }

    /// Returns the value for `key` without changing recency.
    pub fn peek(&self, key: &[u8]) -> Option<&V> {
        let id = self.table.find(key)?;
        self.table.list.get(id).map(|entry| &entry.value)
    }

    /// Returns the least recently used entry without removing it.
    pub fn peek_lru(&self) -> Option<(&[u8], &V)> {
        self.table
            .list
            .back()
            .map(|entry| (&*entry.key, &entry.value))
    }

    /// Returns `true` if `key` is cached. Does not change recency.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.table.find(key).is_some()
    }

    /// Inserts or replaces the value for `key`.
    ///
    /// Evicts from the LRU end in batches until the new entry fits. An
    /// entry whose cost alone exceeds [`max_cost`](Self::max_cost) is
    /// refused and the cache is left exactly as it was, including any value
    /// already stored under `key`.
    pub fn set(&mut self, key: &[u8], value: V) {
        #[cfg(feature = "metrics")]
        self.metrics.record_insert_call();

        let cost = (self.cost_fn)(key, &value);
        if !self.budget.admits(cost) {
            debug!(
                cost,
                max_cost = self.budget.max_cost(),
                key_len = key.len(),
                "refusing entry larger than the cache budget"
            );
            #[cfg(feature = "metrics")]
            self.metrics.record_insert_refused();
            return;
        }

        let mut hits = 0;
        if let Some(id) = self.table.find(key) {
            match self.table.list.get_mut(id) {
                Some(entry) if self.budget.fits_replacing(entry.cost, cost) => {
                    self.budget.refund(entry.cost);
                    self.budget.charge(cost);
                    entry.value = value;
                    entry.cost = cost;
                    self.table.list.move_to_front(id);
                    #[cfg(feature = "metrics")]
                    self.metrics.record_insert_update();
                    return;
                },
                _ => {},
            }
            // No room to grow in place: drop the old entry and insert afresh.
            if let Some(old) = self.table.remove(id) {
                self.budget.refund(old.cost);
                hits = old.hits;
            }
        }

        self.insert_new(key, value, cost, hits);
    }

    fn insert_new(&mut self, key: &[u8], value: V, cost: usize, hits: u32) {
        let report = self.budget.evict_until_fits(&mut self.table, cost);
        self.record_eviction(report);
        debug_assert!(self.budget.fits(cost));

        self.table.insert_front(Entry {
            key: Arc::from(key),
            value,
            cost,
            hits,
        });
        self.budget.charge(cost);
        #[cfg(feature = "metrics")]
        self.metrics.record_insert_new();
    }

    #[cfg(feature = "metrics")]
    fn record_eviction(&mut self, report: EvictionReport) {
        for _ in 0..report.batches {
            self.metrics.record_evict_call();
        }
        for _ in 0..report.evicted {
            self.metrics.record_evicted_entry();
        }
    }

    #[cfg(not(feature = "metrics"))]
    #[inline]
    fn record_eviction(&mut self, _report: EvictionReport) {}

    /// Removes `key`, returning its value if it was cached.
    pub fn delete(&mut self, key: &[u8]) -> Option<V> {
        #[cfg(feature = "metrics")]
        self.metrics.record_delete_call();

        let id = self.table.find(key)?;
        let entry = self.table.remove(id)?;
        self.budget.refund(entry.cost);
        #[cfg(feature = "metrics")]
        self.metrics.record_delete_found();
        Some(entry.value)
    }

    /// Drops every entry and resets the charged cost to zero.
    pub fn clear(&mut self) {
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();

        self.table.clear();
        self.budget.reset();
    }

    /// Aggregate cost of all live entries.
    #[inline]
    pub fn current_cost(&self) -> usize {
        self.budget.current_cost()
    }

    #[inline]
    pub fn max_cost(&self) -> usize {
        self.budget.max_cost()
    }

    #[inline]
    pub fn evict_batch_size(&self) -> usize {
        self.budget.evict_batch_size()
    }

    pub fn index_kind(&self) -> IndexKind {
        self.table.index.kind()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.list.is_empty()
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &V)> {
        self.table
            .list
            .iter()
            .map(|entry| (&*entry.key, &entry.value))
    }

    /// Cross-checks the recency list, the key index and the budget.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.table.list.check_links()?;

        if self.table.index.len() != self.table.list.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but list holds {} entries",
                self.table.index.len(),
                self.table.list.len()
            )));
        }

        let mut cost = 0usize;
        for (id, entry) in self.table.list.iter_entries() {
            cost += entry.cost;
            match self.table.find(&entry.key) {
                Some(found) if found == id => {},
                other => {
                    return Err(InvariantError::new(format!(
                        "key {:?} resolves to {:?}, linked at {:?}",
                        String::from_utf8_lossy(&entry.key),
                        other,
                        id
                    )));
                },
            }
        }

        if let Some(stale) = self
            .table
            .index
            .slot_ids()
            .find(|&id| !self.table.list.contains(id))
        {
            return Err(InvariantError::new(format!(
                "index points at released slot {stale:?}"
            )));
        }

        if cost != self.budget.current_cost() {
            return Err(InvariantError::new(format!(
                "entries cost {cost} but budget charged {}",
                self.budget.current_cost()
            )));
        }
        if cost > self.budget.max_cost() {
            return Err(InvariantError::new(format!(
                "cost {cost} exceeds max_cost {}",
                self.budget.max_cost()
            )));
        }
        Ok(())
    }
}

#[cfg(feature = "metrics")]
impl<V> LruCache<V> {
    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics
            .snapshot(self.len(), self.current_cost(), self.max_cost())
    }
}

#[cfg(feature = "metrics")]
impl<V> MetricsSnapshotProvider<CacheMetricsSnapshot> for LruCache<V> {
    fn snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.len())
            .field("current_cost", &self.current_cost())
            .field("max_cost", &self.max_cost())
            .field("evict_batch_size", &self.evict_batch_size())
            .field("index", &self.index_kind())
            .finish_non_exhaustive()
    }
}

/// Thread-safe [`LruCache`] behind a single `parking_lot::RwLock`.
///
/// Values are stored as `Arc<V>`; reads hand out `Arc::clone`s, so `get`
/// never copies or allocates whatever `V` is.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use memlru::policy::lru::ConcurrentLruCache;
///
/// let cache: Arc<ConcurrentLruCache<String>> = Arc::new(ConcurrentLruCache::new(1024));
///
/// let writer = {
///     let cache = Arc::clone(&cache);
///     thread::spawn(move || cache.set(b"k", "v".to_string()))
/// };
/// writer.join().unwrap();
///
/// assert_eq!(cache.get(b"k").as_deref().map(String::as_str), Some("v"));
/// assert_eq!(cache.current_cost(), 2);
/// ```
pub struct ConcurrentLruCache<V> {
    inner: RwLock<LruCache<Arc<V>>>,
    current_cost: AtomicUsize,
    max_cost: usize,
}

impl<V: Weigh + 'static> ConcurrentLruCache<V> {
    /// # Panics
    ///
    /// Panics if `max_cost` is zero.
    pub fn new(max_cost: usize) -> Self {
        match Self::try_new(max_cost) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroMaxCost`] if `max_cost` is zero.
    pub fn try_new(max_cost: usize) -> Result<Self, ConfigError> {
        CacheBuilder::new(max_cost).try_build_concurrent()
    }

    pub fn builder(max_cost: usize) -> CacheBuilder<V> {
        CacheBuilder::new(max_cost)
    }
}

impl<V> ConcurrentLruCache<V> {
    /// Wraps an existing cache of shared values, keeping its entries.
    pub fn from_cache(cache: LruCache<Arc<V>>) -> Self {
        Self {
            current_cost: AtomicUsize::new(cache.current_cost()),
            max_cost: cache.max_cost(),
            inner: RwLock::new(cache),
        }
    }

    /// Returns the value for `key` and marks it most recently used.
    pub fn get(&self, key: &[u8]) -> Option<Arc<V>> {
        self.inner.write().get(key).map(Arc::clone)
    }

    pub fn get_with_hits(&self, key: &[u8]) -> Option<(Arc<V>, u32)> {
        self.inner
            .write()
            .get_with_hits(key)
            .map(|(value, hits)| (Arc::clone(value), hits))
    }

    /// Returns the value for `key` without changing recency.
    pub fn peek(&self, key: &[u8]) -> Option<Arc<V>> {
        self.inner.read().peek(key).map(Arc::clone)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.inner.read().contains(key)
    }

    pub fn set(&self, key: &[u8], value: V) {
        self.set_arc(key, Arc::new(value));
    }

    /// Inserts an already shared value without wrapping it again.
    pub fn set_arc(&self, key: &[u8], value: Arc<V>) {
        let mut cache = self.inner.write();
        cache.set(key, value);
        self.current_cost
            .store(cache.current_cost(), Ordering::Relaxed);
    }

    pub fn delete(&self, key: &[u8]) -> Option<Arc<V>> {
        let mut cache = self.inner.write();
        let removed = cache.delete(key);
        self.current_cost
            .store(cache.current_cost(), Ordering::Relaxed);
        removed
    }

    pub fn clear(&self) {
        let mut cache = self.inner.write();
        cache.clear();
        self.current_cost.store(0, Ordering::Relaxed);
    }

    /// Aggregate cost as of the last completed write. Takes no lock.
    #[inline]
    pub fn current_cost(&self) -> usize {
        self.current_cost.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn max_cost(&self) -> usize {
        self.max_cost
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Runs [`LruCache::check_invariants`] under the read lock and checks
    /// the lock-free cost mirror against it.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let cache = self.inner.read();
        cache.check_invariants()?;
        let mirrored = self.current_cost.load(Ordering::Relaxed);
        if mirrored != cache.current_cost() {
            return Err(InvariantError::new(format!(
                "cost mirror {mirrored} disagrees with charged cost {}",
                cache.current_cost()
            )));
        }
        Ok(())
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        self.inner.read().metrics_snapshot()
    }
}

impl<V> fmt::Debug for ConcurrentLruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentLruCache")
            .field("current_cost", &self.current_cost())
            .field("max_cost", &self.max_cost)
            .finish_non_exhaustive()
    }
}

impl<V> ConcurrentCache<V> for ConcurrentLruCache<V>
where
    V: Send + Sync,
{
    fn get(&self, key: &[u8]) -> Option<Arc<V>> {
        ConcurrentLruCache::get(self, key)
    }

    fn set(&self, key: &[u8], value: V) {
        ConcurrentLruCache::set(self, key, value);
    }

    fn delete(&self, key: &[u8]) -> Option<Arc<V>> {
        ConcurrentLruCache::delete(self, key)
    }

    fn current_cost(&self) -> usize {
        ConcurrentLruCache::current_cost(self)
    }

    fn max_cost(&self) -> usize {
        self.max_cost
    }

    fn len(&self) -> usize {
        ConcurrentLruCache::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_cost: usize) -> LruCache<Vec<u8>> {
        LruCache::new(max_cost)
    }

    fn hashed(max_cost: usize) -> LruCache<Vec<u8>> {
        LruCache::builder(max_cost).index(IndexKind::Hashed).build()
    }

    fn keys<V>(cache: &LruCache<V>) -> Vec<Vec<u8>> {
        cache.iter().map(|(k, _)| k.to_vec()).collect()
    }

    mod basic_behavior {
        use super::*;

        #[test]
        fn set_then_get_returns_value_and_charges_cost() {
            for mut cache in [cache(100), hashed(100)] {
                cache.set(b"key", b"value".to_vec());
                assert_eq!(cache.get(b"key").map(Vec::as_slice), Some(&b"value"[..]));
                assert_eq!(cache.current_cost(), 8);
                assert_eq!(cache.len(), 1);
                cache.check_invariants().unwrap();
            }
        }

        #[test]
        fn missing_key_is_none() {
            let mut cache = cache(10);
            assert!(cache.get(b"nope").is_none());
            assert!(cache.peek(b"nope").is_none());
            assert!(!cache.contains(b"nope"));
            assert!(cache.delete(b"nope").is_none());
        }

        #[test]
        fn delete_returns_value_and_refunds() {
            for mut cache in [cache(100), hashed(100)] {
                cache.set(b"a", vec![1; 4]);
                cache.set(b"b", vec![2; 4]);
                assert_eq!(cache.delete(b"a"), Some(vec![1; 4]));
                assert_eq!(cache.current_cost(), 5);
                assert!(cache.delete(b"a").is_none());
                assert_eq!(cache.len(), 1);
                cache.check_invariants().unwrap();
            }
        }

        #[test]
        fn empty_key_and_value_are_allowed() {
            let mut cache = cache(1);
            cache.set(b"", Vec::new());
            assert_eq!(cache.current_cost(), 0);
            assert_eq!(cache.get(b""), Some(&Vec::new()));
        }

        #[test]
        fn clear_drops_everything() {
            let mut cache = cache(100);
            for i in 0..5u8 {
                cache.set(&[i], vec![i; 3]);
            }
            cache.clear();
            assert!(cache.is_empty());
            assert_eq!(cache.current_cost(), 0);
            assert!(cache.get(&[0]).is_none());
            cache.set(b"x", vec![0; 2]);
            assert_eq!(cache.current_cost(), 3);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn try_new_rejects_zero_budget() {
            assert_eq!(
                LruCache::<Vec<u8>>::try_new(0).unwrap_err(),
                ConfigError::ZeroMaxCost
            );
        }

        #[test]
        #[should_panic(expected = "max_cost must be greater than zero")]
        fn new_panics_on_zero_budget() {
            let _ = LruCache::<Vec<u8>>::new(0);
        }
    }

    mod recency {
        use super::*;

        #[test]
        fn get_promotes_and_spares_entry_from_eviction() {
            for mut cache in [cache(20), hashed(20)] {
                cache.set(b"a", vec![0; 9]);
                cache.set(b"b", vec![0; 9]);
                assert_eq!(keys(&cache), vec![b"b".to_vec(), b"a".to_vec()]);

                cache.get(b"a");
                assert_eq!(keys(&cache), vec![b"a".to_vec(), b"b".to_vec()]);

                cache.set(b"c", vec![0; 9]);
                assert!(cache.contains(b"a"));
                assert!(!cache.contains(b"b"));
                assert!(cache.contains(b"c"));
                cache.check_invariants().unwrap();
            }
        }

        #[test]
        fn peek_leaves_order_alone() {
            let mut cache = cache(20);
            cache.set(b"a", vec![0; 9]);
            cache.set(b"b", vec![0; 9]);
            assert!(cache.peek(b"a").is_some());
            assert!(cache.contains(b"a"));
            assert_eq!(cache.peek_lru().map(|(k, _)| k), Some(&b"a"[..]));

            cache.set(b"c", vec![0; 9]);
            assert!(!cache.contains(b"a"));
        }

        #[test]
        fn update_moves_to_front() {
            let mut cache = cache(100);
            cache.set(b"a", vec![0; 1]);
            cache.set(b"b", vec![0; 1]);
            cache.set(b"a", vec![0; 2]);
            assert_eq!(keys(&cache), vec![b"a".to_vec(), b"b".to_vec()]);
        }
    }

    mod cost_accounting {
        use super::*;

        #[test]
        fn update_replaces_cost_instead_of_adding() {
            for mut cache in [cache(100), hashed(100)] {
                cache.set(b"k", vec![0; 10]);
                cache.set(b"k", vec![0; 4]);
                assert_eq!(cache.len(), 1);
                assert_eq!(cache.current_cost(), 5);
                cache.set(b"k", vec![0; 30]);
                assert_eq!(cache.current_cost(), 31);
                cache.check_invariants().unwrap();
            }
        }

        #[test]
        fn growing_update_evicts_others_first() {
            let mut cache = cache(20);
            cache.set(b"a", vec![0; 4]); // 5
            cache.set(b"b", vec![0; 4]); // 5
            cache.set(b"c", vec![0; 4]); // 5
            cache.set(b"c", vec![0; 14]); // 15, only a has to go
            assert_eq!(keys(&cache), vec![b"c".to_vec(), b"b".to_vec()]);
            assert_eq!(cache.current_cost(), 20);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn oversized_entry_is_refused_silently() {
            for mut cache in [cache(10), hashed(10)] {
                cache.set(b"a", vec![0; 3]);
                cache.set(b"huge", vec![0; 100]);
                assert!(!cache.contains(b"huge"));
                assert!(cache.contains(b"a"));
                assert_eq!(cache.current_cost(), 4);
                cache.check_invariants().unwrap();
            }
        }

        #[test]
        fn entry_exactly_at_budget_fits() {
            let mut cache = cache(10);
            cache.set(b"a", vec![0; 2]);
            cache.set(b"k", vec![0; 9]);
            assert_eq!(keys(&cache), vec![b"k".to_vec()]);
            assert_eq!(cache.current_cost(), 10);
        }

        #[test]
        fn oversized_update_keeps_the_old_value() {
            for mut cache in [cache(10), hashed(10)] {
                cache.set(b"a", vec![0; 2]);
                cache.set(b"k", vec![0; 3]);
                cache.set(b"k", vec![0; 50]);

                assert_eq!(cache.peek(b"k"), Some(&vec![0; 3]));
                assert!(cache.contains(b"a"));
                assert_eq!(cache.current_cost(), 7);
                // recency untouched: "a" is still the LRU entry
                assert_eq!(cache.peek_lru().map(|(k, _)| k), Some(&b"a"[..]));
                cache.check_invariants().unwrap();
            }
        }

        #[test]
        fn custom_cost_function_is_used() {
            let mut cache: LruCache<u64> =
                CacheBuilder::with_cost_fn(3, |_: &[u8], _: &u64| 1).build();
            for i in 0..10u64 {
                cache.set(&i.to_le_bytes(), i);
            }
            assert_eq!(cache.len(), 3);
            assert_eq!(cache.current_cost(), 3);
            assert_eq!(cache.peek(&9u64.to_le_bytes()), Some(&9));
        }
    }

    mod batching {
        use super::*;

        #[test]
        fn batch_eviction_takes_whole_batch() {
            let mut cache: LruCache<Vec<u8>> = LruCache::builder(10).evict_batch_size(3).build();
            for k in b"abcde" {
                cache.set(&[*k], vec![0; 1]); // cost 2 each, total 10
            }
            cache.set(b"f", vec![0; 1]);
            // a, b, c gone in one batch although evicting a alone would do
            assert_eq!(
                keys(&cache),
                vec![b"f".to_vec(), b"e".to_vec(), b"d".to_vec()]
            );
            assert_eq!(cache.current_cost(), 6);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn batch_larger_than_cache_empties_it() {
            let mut cache: LruCache<Vec<u8>> = LruCache::builder(6).evict_batch_size(100).build();
            cache.set(b"a", vec![0; 1]);
            cache.set(b"b", vec![0; 1]);
            cache.set(b"c", vec![0; 1]);
            cache.set(b"d", vec![0; 1]);
            assert_eq!(keys(&cache), vec![b"d".to_vec()]);
            assert_eq!(cache.current_cost(), 2);
        }
    }

    mod hit_counting {
        use super::*;

        #[test]
        fn counts_reads_and_survives_updates() {
            let mut cache = cache(100);
            cache.set(b"k", vec![1]);
            assert_eq!(cache.get_with_hits(b"k").map(|(_, h)| h), Some(1));
            assert_eq!(cache.get_with_hits(b"k").map(|(_, h)| h), Some(2));
            cache.set(b"k", vec![2]);
            assert_eq!(cache.get_with_hits(b"k").map(|(_, h)| h), Some(3));
            assert!(cache.peek(b"k").is_some());
            assert_eq!(cache.get_with_hits(b"k").map(|(_, h)| h), Some(4));
        }

        #[test]
        fn reinsert_after_delete_restarts_count() {
            let mut cache = cache(100);
            cache.set(b"k", vec![1]);
            cache.get(b"k");
            cache.delete(b"k");
            cache.set(b"k", vec![1]);
            assert_eq!(cache.get_with_hits(b"k").map(|(_, h)| h), Some(1));
        }
    }

    mod hashed_index {
        use super::*;

        fn colliding(max_cost: usize) -> LruCache<Vec<u8>> {
            LruCache::builder(max_cost)
                .index(IndexKind::Hashed)
                .hash_fn(|_: &[u8]| 42)
                .build()
        }

        #[test]
        fn colliding_keys_never_alias() {
            let mut cache = colliding(100);
            cache.set(b"left", b"L".to_vec());
            cache.set(b"right", b"R".to_vec());
            assert_eq!(cache.get(b"left"), Some(&b"L".to_vec()));
            assert_eq!(cache.get(b"right"), Some(&b"R".to_vec()));
            assert!(cache.get(b"other").is_none());
            cache.check_invariants().unwrap();
        }

        #[test]
        fn colliding_keys_delete_and_evict_independently() {
            let mut cache = colliding(12);
            cache.set(b"aa", vec![0; 2]); // 4
            cache.set(b"bb", vec![0; 2]); // 4
            cache.set(b"cc", vec![0; 2]); // 4
            assert_eq!(cache.delete(b"bb"), Some(vec![0; 2]));
            assert!(cache.contains(b"aa"));
            assert!(cache.contains(b"cc"));

            cache.set(b"dd", vec![0; 6]); // 8, evicts aa
            assert!(!cache.contains(b"aa"));
            assert!(cache.contains(b"cc"));
            assert!(cache.contains(b"dd"));
            cache.check_invariants().unwrap();
        }
    }

    mod concurrent {
        use super::*;
        use std::thread;

        #[test]
        fn cost_mirror_tracks_writes() {
            let cache: ConcurrentLruCache<Vec<u8>> = ConcurrentLruCache::new(50);
            cache.set(b"a", vec![0; 9]);
            assert_eq!(cache.current_cost(), 10);
            cache.set(b"a", vec![0; 4]);
            assert_eq!(cache.current_cost(), 5);
            assert_eq!(cache.delete(b"a").as_deref(), Some(&vec![0; 4]));
            assert_eq!(cache.current_cost(), 0);
            cache.set(b"b", vec![0; 1]);
            cache.clear();
            assert_eq!(cache.current_cost(), 0);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn parallel_writers_keep_budget() {
            let cache: Arc<ConcurrentLruCache<Vec<u8>>> = Arc::new(ConcurrentLruCache::new(256));
            let handles: Vec<_> = (0..4u8)
                .map(|t| {
                    let cache = Arc::clone(&cache);
                    thread::spawn(move || {
                        for i in 0..500u16 {
                            let key = [t, (i % 64) as u8];
                            cache.set(&key, vec![t; usize::from(i % 17)]);
                            let _ = cache.get(&key);
                            if i % 7 == 0 {
                                cache.delete(&key);
                            }
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
            assert!(cache.current_cost() <= cache.max_cost());
            cache.check_invariants().unwrap();
        }

        #[test]
        fn trait_object_view() {
            let cache: Box<dyn ConcurrentCache<Vec<u8>>> =
                Box::new(ConcurrentLruCache::<Vec<u8>>::new(10));
            cache.set(b"k", vec![1, 2]);
            assert_eq!(cache.get(b"k").as_deref(), Some(&vec![1, 2]));
            assert_eq!(cache.len(), 1);
            assert!(!cache.is_empty());
        }

        #[test]
        fn reads_share_the_stored_value() {
            let cache: ConcurrentLruCache<Vec<u8>> = ConcurrentLruCache::new(100);
            let shared = Arc::new(vec![7u8; 10]);
            cache.set_arc(b"k", Arc::clone(&shared));

            let first = cache.get(b"k").unwrap();
            let second = cache.peek(b"k").unwrap();
            assert!(Arc::ptr_eq(&first, &shared));
            assert!(Arc::ptr_eq(&second, &shared));
            assert_eq!(cache.get_with_hits(b"k").map(|(_, hits)| hits), Some(2));
            // charged for the value, not the pointer
            assert_eq!(cache.current_cost(), 11);
        }

        #[test]
        fn oversized_update_is_refused_without_losing_the_key() {
            let cache: ConcurrentLruCache<Vec<u8>> = ConcurrentLruCache::new(10);
            cache.set(b"k", vec![0; 3]);
            cache.set(b"k", vec![0; 50]);
            assert_eq!(cache.get(b"k").as_deref(), Some(&vec![0; 3]));
            assert_eq!(cache.current_cost(), 4);
            cache.check_invariants().unwrap();
        }
    }

    #[cfg(feature = "metrics")]
    mod metrics {
        use super::*;

        #[test]
        fn counters_follow_operations() {
            let mut cache: LruCache<Vec<u8>> = LruCache::builder(10).evict_batch_size(2).build();
            cache.set(b"a", vec![0; 3]); // new
            cache.set(b"a", vec![0; 2]); // update
            cache.set(b"b", vec![0; 3]); // new
            cache.set(b"c", vec![0; 5]); // new, one batch of 2
            cache.set(b"x", vec![0; 50]); // refused
            cache.get(b"c");
            cache.get(b"a");
            cache.delete(b"c");

            let snap = cache.metrics_snapshot();
            assert_eq!(snap.insert_calls, 5);
            assert_eq!(snap.insert_new, 3);
            assert_eq!(snap.insert_updates, 1);
            assert_eq!(snap.insert_refused, 1);
            assert_eq!(snap.evict_calls, 1);
            assert_eq!(snap.evicted_entries, 2);
            assert_eq!((snap.get_hits, snap.get_misses), (1, 1));
            assert_eq!((snap.delete_calls, snap.delete_found), (1, 1));
            assert_eq!(snap.len, 0);
            assert_eq!(snap.max_cost, 10);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Set(u8, usize),
            Get(u8),
            Delete(u8),
            Peek(u8),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                3 => (0u8..24, 0usize..40).prop_map(|(k, n)| Op::Set(k, n)),
                2 => (0u8..24).prop_map(Op::Get),
                1 => (0u8..24).prop_map(Op::Delete),
                1 => (0u8..24).prop_map(Op::Peek),
            ]
        }

        /// Straight-line reference: entries MRU-first as `(key, cost)`.
        #[derive(Default)]
        struct Model {
            entries: Vec<(u8, usize)>,
        }

        impl Model {
            fn cost(&self) -> usize {
                self.entries.iter().map(|&(_, c)| c).sum()
            }

            fn position(&self, key: u8) -> Option<usize> {
                self.entries.iter().position(|&(k, _)| k == key)
            }

            fn get(&mut self, key: u8) {
                if let Some(i) = self.position(key) {
                    let entry = self.entries.remove(i);
                    self.entries.insert(0, entry);
                }
            }

            fn delete(&mut self, key: u8) {
                if let Some(i) = self.position(key) {
                    self.entries.remove(i);
                }
            }

            fn set(&mut self, key: u8, cost: usize, max: usize, batch: usize) {
                if cost > max {
                    return;
                }
                if let Some(i) = self.position(key) {
                    self.entries.remove(i);
                    if self.cost() + cost <= max {
                        self.entries.insert(0, (key, cost));
                        return;
                    }
                }
                while self.cost() + cost > max {
                    for _ in 0..batch {
                        if self.entries.pop().is_none() {
                            break;
                        }
                    }
                }
                self.entries.insert(0, (key, cost));
            }
        }

        proptest! {
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_matches_reference_model(
                max_cost in 1usize..120,
                batch in 1usize..5,
                use_hashed in any::<bool>(),
                ops in prop::collection::vec(op_strategy(), 0..150)
            ) {
                let kind = if use_hashed { IndexKind::Hashed } else { IndexKind::Exact };
                let mut cache: LruCache<Vec<u8>> = LruCache::builder(max_cost)
                    .evict_batch_size(batch)
                    .index(kind)
                    .build();
                let mut model = Model::default();

                for op in ops {
                    match op {
                        Op::Set(k, n) => {
                            cache.set(&[k], vec![k; n]);
                            model.set(k, n + 1, max_cost, batch);
                        },
                        Op::Get(k) => {
                            let hit = cache.get(&[k]).is_some();
                            prop_assert_eq!(hit, model.position(k).is_some());
                            model.get(k);
                        },
                        Op::Delete(k) => {
                            let removed = cache.delete(&[k]);
                            prop_assert_eq!(removed.is_some(), model.position(k).is_some());
                            model.delete(k);
                        },
                        Op::Peek(k) => {
                            prop_assert_eq!(cache.peek(&[k]).is_some(), model.position(k).is_some());
                        },
                    }
                    cache.check_invariants().unwrap();
                    prop_assert!(cache.current_cost() <= max_cost);
                    prop_assert_eq!(cache.current_cost(), model.cost());
                    let order: Vec<u8> = cache.iter().map(|(k, _)| k[0]).collect();
                    let expected: Vec<u8> = model.entries.iter().map(|&(k, _)| k).collect();
                    prop_assert_eq!(order, expected);
                }
            }

            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_values_round_trip_until_evicted(
                max_cost in 1usize..200,
                writes in prop::collection::vec((0u8..16, 0usize..30), 1..80)
            ) {
                let mut cache: LruCache<Vec<u8>> = LruCache::new(max_cost);
                for (k, n) in writes {
                    let previous = cache.peek(&[k]).cloned();
                    cache.set(&[k], vec![k; n]);
                    if n < max_cost {
                        prop_assert_eq!(cache.peek(&[k]), Some(&vec![k; n]));
                    } else {
                        prop_assert_eq!(cache.peek(&[k]).cloned(), previous);
                    }
                }
            }
        }
    }
}
