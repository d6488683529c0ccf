//! Cost accounting and batch eviction.
//!
//! ## Architecture
//!
//! ```text
//!   set(key, value)  cost = cost_fn(key, value)
//!        │
//!        ▼
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │  CostBudget { max_cost, current_cost, evict_batch_size }     │
//!   │                                                              │
//!   │  admits(cost)?  ── no ──► refuse (entry alone is too big)    │
//!   │       │ yes                                                  │
//!   │       ▼                                                      │
//!   │  while !fits(cost):                                          │
//!   │      evict_batch():  up to evict_batch_size × pop_lru()      │
//!   │                      refund each evicted entry's cost        │
//!   │       │                                                      │
//!   │       ▼                                                      │
//!   │  charge(cost)                                                │
//!   └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A batch pops up to `evict_batch_size` tail entries in one go and only
//! stops early when the cache runs dry, so a larger batch frees headroom for
//! the next few inserts. Batches repeat until the incoming cost fits, so the
//! batch size never leaves the cache over budget.
//!
//! The budget does not know about lists or indexes; it drives anything that
//! implements [`EvictLru`].

use std::sync::Arc;

use tracing::trace;

use crate::error::ConfigError;
use crate::traits::Weigh;

/// Pluggable cost function: `(key, value) → cost`.
pub type CostFn<V> = Arc<dyn Fn(&[u8], &V) -> usize + Send + Sync>;

/// Default cost: key length plus the value's [`Weigh::weight`].
///
/// ```
/// use memlru::policy::budget::default_cost;
///
/// assert_eq!(default_cost(b"k", &b"0123456789".to_vec()), 11);
/// ```
#[inline]
pub fn default_cost<V: Weigh + ?Sized>(key: &[u8], value: &V) -> usize {
    key.len().saturating_add(value.weight())
}

/// Source of least-recently-used victims.
pub trait EvictLru {
    /// Removes the least recently used entry and returns the cost it was
    /// charged with, or `None` if nothing is left.
    fn evict_lru(&mut self) -> Option<usize>;
}

/// Result of one [`CostBudget::evict_until_fits`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Batches run.
    pub batches: usize,
    /// Entries evicted across all batches.
    pub evicted: usize,
    /// Cost released across all batches.
    pub freed: usize,
}

/// Tracks aggregate cost against a fixed budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostBudget {
    max_cost: usize,
    current_cost: usize,
    evict_batch_size: usize,
}

impl CostBudget {
    /// Creates an empty budget.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroMaxCost`] if `max_cost` is zero and
    /// [`ConfigError::ZeroEvictBatch`] if `evict_batch_size` is zero.
    pub fn try_new(max_cost: usize, evict_batch_size: usize) -> Result<Self, ConfigError> {
        if max_cost == 0 {
            return Err(ConfigError::ZeroMaxCost);
        }
        if evict_batch_size == 0 {
            return Err(ConfigError::ZeroEvictBatch);
        }
        Ok(Self {
            max_cost,
            current_cost: 0,
            evict_batch_size,
        })
    }

    #[inline]
    pub fn max_cost(&self) -> usize {
        self.max_cost
    }

    #[inline]
    pub fn current_cost(&self) -> usize {
        self.current_cost
    }

    #[inline]
    pub fn evict_batch_size(&self) -> usize {
        self.evict_batch_size
    }

    /// `true` if an entry of `cost` could fit in an otherwise empty cache.
    #[inline]
    pub fn admits(&self, cost: usize) -> bool {
        cost <= self.max_cost
    }

    /// `true` if `incoming` fits on top of what is already charged.
    #[inline]
    pub fn fits(&self, incoming: usize) -> bool {
        self.current_cost
            .checked_add(incoming)
            .is_some_and(|total| total <= self.max_cost)
    }

    /// `true` if swapping an entry of cost `old` for one of cost `new` keeps
    /// the total within budget.
    #[inline]
    pub fn fits_replacing(&self, old: usize, new: usize) -> bool {
        (self.current_cost - old)
            .checked_add(new)
            .is_some_and(|total| total <= self.max_cost)
    }

    #[inline]
    pub fn charge(&mut self, cost: usize) {
        self.current_cost += cost;
    }

    #[inline]
    pub fn refund(&mut self, cost: usize) {
        debug_assert!(cost <= self.current_cost, "refund exceeds charged cost");
        self.current_cost = self.current_cost.saturating_sub(cost);
    }

    /// Forgets all charged cost.
    pub fn reset(&mut self) {
        self.current_cost = 0;
    }

    /// Evicts batches from `target` until `incoming` fits or `target` is empty.
    pub fn evict_until_fits<T: EvictLru>(
        &mut self,
        target: &mut T,
        incoming: usize,
    ) -> EvictionReport {
        let mut report = EvictionReport::default();
        while !self.fits(incoming) {
            let (evicted, freed) = self.evict_batch(target);
            if evicted == 0 {
                break;
            }
            report.batches += 1;
            report.evicted += evicted;
            report.freed += freed;
        }
        report
    }

    /// Runs one batch; returns `(entries evicted, cost freed)`.
    fn evict_batch<T: EvictLru>(&mut self, target: &mut T) -> (usize, usize) {
        let mut evicted = 0;
        let mut freed = 0;
        while evicted < self.evict_batch_size {
            let Some(cost) = target.evict_lru() else {
                break;
            };
            self.refund(cost);
            evicted += 1;
            freed += cost;
        }
        if evicted > 0 {
            trace!(
                evicted,
                freed,
                current_cost = self.current_cost,
                max_cost = self.max_cost,
                "evicted lru batch"
            );
        }
        (evicted, freed)
    }
}
