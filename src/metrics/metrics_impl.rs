use crate::metrics::snapshot::CacheMetricsSnapshot;
use crate::metrics::traits::{CoreMetricsRecorder, CostMetricsRecorder};

/// Plain counters owned by one [`LruCache`](crate::policy::lru::LruCache).
///
/// Only `&mut self` paths record; the concurrent wrappers already hold the
/// write lock there.
#[derive(Debug, Default, Clone)]
pub struct LruMetrics {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    pub insert_calls: u64,
    pub insert_updates: u64,
    pub insert_new: u64,
    pub insert_refused: u64,
    pub evict_calls: u64,
    pub evicted_entries: u64,
    pub delete_calls: u64,
    pub delete_found: u64,
    pub clear_calls: u64,
}

impl LruMetrics {
    /// Copies the counters and attaches the given gauges.
    pub fn snapshot(&self, len: usize, current_cost: usize, max_cost: usize) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            get_calls: self.get_calls,
            get_hits: self.get_hits,
            get_misses: self.get_misses,
            insert_calls: self.insert_calls,
            insert_updates: self.insert_updates,
            insert_new: self.insert_new,
            insert_refused: self.insert_refused,
            evict_calls: self.evict_calls,
            evicted_entries: self.evicted_entries,
            delete_calls: self.delete_calls,
            delete_found: self.delete_found,
            clear_calls: self.clear_calls,
            len,
            current_cost,
            max_cost,
        }
    }
}

impl CoreMetricsRecorder for LruMetrics {
    fn record_get_hit(&mut self) {
        self.get_calls += 1;
        self.get_hits += 1;
    }

    fn record_get_miss(&mut self) {
        self.get_calls += 1;
        self.get_misses += 1;
    }

    fn record_insert_call(&mut self) {
        self.insert_calls += 1;
    }

    fn record_insert_new(&mut self) {
        self.insert_new += 1;
    }

    fn record_insert_update(&mut self) {
        self.insert_updates += 1;
    }

    fn record_evict_call(&mut self) {
        self.evict_calls += 1;
    }

    fn record_evicted_entry(&mut self) {
        self.evicted_entries += 1;
    }

    fn record_clear(&mut self) {
        self.clear_calls += 1;
    }
}

impl CostMetricsRecorder for LruMetrics {
    fn record_insert_refused(&mut self) {
        self.insert_refused += 1;
    }

    fn record_delete_call(&mut self) {
        self.delete_calls += 1;
    }

    fn record_delete_found(&mut self) {
        self.delete_found += 1;
    }
}
