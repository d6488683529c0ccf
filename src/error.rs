//! Error types for memlru.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache construction parameters are invalid
//!   (zero cost budget, zero eviction batch, shard count that is not a power
//!   of two).
//! - [`InvariantError`]: Returned by `check_invariants` when the arena, the
//!   recency list, the key index, and the cost counter disagree.
//!
//! Runtime cache traffic never produces an error: a miss is `None` and an
//! entry too large for the budget is dropped silently.
//!
//! ## Example Usage
//!
//! ```
//! use memlru::error::ConfigError;
//! use memlru::policy::lru::LruCache;
//!
//! let cache: Result<LruCache<Vec<u8>>, ConfigError> = LruCache::try_new(1024);
//! assert!(cache.is_ok());
//!
//! // A zero budget is caught without panicking
//! let bad = LruCache::<Vec<u8>>::try_new(0);
//! assert!(bad.is_err());
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by fallible constructors such as
/// [`LruCache::try_new`](crate::policy::lru::LruCache::try_new) and the
/// builder's `try_build*` methods. The panicking constructors format this
/// error into their panic message.
///
/// # Example
///
/// ```
/// use memlru::policy::sharded::ShardedLruCache;
///
/// let err = ShardedLruCache::<Vec<u8>>::try_new(3, 1024).unwrap_err();
/// assert!(err.to_string().contains("power of two"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The cost budget was zero.
    #[error("max_cost must be greater than zero")]
    ZeroMaxCost,

    /// The eviction batch size was zero.
    #[error("evict_batch_size must be at least 1")]
    ZeroEvictBatch,

    /// The shard count was zero or not a power of two.
    #[error("shard_count must be a non-zero power of two, got {0}")]
    ShardCount(usize),

    /// Splitting the total budget across shards left each shard with nothing.
    #[error("total cost {total} is smaller than shard_count {shards}; every shard would get a zero budget")]
    ShardBudget { total: usize, shards: usize },
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by [`LruCache::check_invariants`](crate::policy::lru::LruCache::check_invariants)
/// and its concurrent and sharded counterparts. Carries a human-readable
/// description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
