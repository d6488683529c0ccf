/// Point-in-time copy of a cache's counters and gauges.
///
/// Counters only grow; `len`, `current_cost` and `max_cost` are gauges read
/// at snapshot time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
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

    pub len: usize,
    pub current_cost: usize,
    pub max_cost: usize,
}

impl CacheMetricsSnapshot {
    /// Hit ratio over all `get` calls, `0.0` before the first call.
    pub fn hit_ratio(&self) -> f64 {
        if self.get_calls == 0 {
            0.0
        } else {
            self.get_hits as f64 / self.get_calls as f64
        }
    }

    /// Sums two snapshots; used to aggregate shards.
    pub fn merge(self, other: Self) -> Self {
        Self {
            get_calls: self.get_calls + other.get_calls,
            get_hits: self.get_hits + other.get_hits,
            get_misses: self.get_misses + other.get_misses,
            insert_calls: self.insert_calls + other.insert_calls,
            insert_updates: self.insert_updates + other.insert_updates,
            insert_new: self.insert_new + other.insert_new,
            insert_refused: self.insert_refused + other.insert_refused,
            evict_calls: self.evict_calls + other.evict_calls,
            evicted_entries: self.evicted_entries + other.evicted_entries,
            delete_calls: self.delete_calls + other.delete_calls,
            delete_found: self.delete_found + other.delete_found,
            clear_calls: self.clear_calls + other.clear_calls,
            len: self.len + other.len,
            current_cost: self.current_cost + other.current_cost,
            max_cost: self.max_cost + other.max_cost,
        }
    }
}
