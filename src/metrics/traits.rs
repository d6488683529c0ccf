//! # Metrics Traits
//!
//! Recording and snapshotting are split so the cache engines only ever
//! write counters, and callers only ever read copies.
//!
//! ```text
//!   ┌─────────────────────────────┐
//!   │     CoreMetricsRecorder     │
//!   │  get_hit/get_miss/insert    │
//!   │  evict/clear                │
//!   └──────────────┬──────────────┘
//!                  │
//!                  ▼
//!   ┌─────────────────────────────┐      ┌──────────────────────────────┐
//!   │     CostMetricsRecorder     │      │ MetricsSnapshotProvider<S>   │
//!   │  refused/delete             │      │ (tests, benches, dashboards) │
//!   └─────────────────────────────┘      └──────────────────────────────┘
//! ```

/// Common counters for any cache.
pub trait CoreMetricsRecorder {
    fn record_get_hit(&mut self);
    fn record_get_miss(&mut self);
    fn record_insert_call(&mut self);
    fn record_insert_new(&mut self);
    fn record_insert_update(&mut self);
    fn record_evict_call(&mut self);
    fn record_evicted_entry(&mut self);
    fn record_clear(&mut self);
}

/// Counters specific to a cost-bounded cache.
pub trait CostMetricsRecorder: CoreMetricsRecorder {
    /// An entry was dropped because its cost alone exceeds the budget.
    fn record_insert_refused(&mut self);
    fn record_delete_call(&mut self);
    fn record_delete_found(&mut self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}
