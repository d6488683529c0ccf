//! Key hashing and power-of-two shard selection.
//!
//! Provides the pluggable [`HashFn`] shared by the hashed key index and the
//! shard router, plus the deterministic key-to-shard mapping used by
//! [`ShardedLruCache`](crate::policy::sharded::ShardedLruCache).
//!
//! ## Architecture
//!
//! ```text
//!   key bytes
//!       │
//!       ▼
//!   ┌──────────────────────────────────────────────┐
//!   │  ShardSelector { mask: 3, hash: HashFn }     │
//!   │                                              │
//!   │  1. h = hash(key)            (u64)           │
//!   │  2. shard = h & mask         (mask = n - 1)  │
//!   └──────────────────────────────────────────────┘
//!       │
//!       ▼
//!   ┌─────────┬─────────┬─────────┬─────────┐
//!   │ Shard 0 │ Shard 1 │ Shard 2 │ Shard 3 │
//!   └─────────┴─────────┴─────────┴─────────┘
//! ```
//!
//! ## Key Concepts
//!
//! - **Power-of-two shard count**: masking replaces modulo. Any other count
//!   is rejected at construction.
//! - **Stable across runs**: [`default_hash`] is FxHash over the raw key bytes
//!   with no per-process seed, so a key maps to the same shard in every
//!   process that uses the same shard count.
//! - **Pluggable**: tests inject a hash function to force collisions.
//!
//! ## Example Usage
//!
//! ```
//! use memlru::ds::ShardSelector;
//!
//! let selector = ShardSelector::new(4);
//! let shard = selector.shard_for_key(b"user:123");
//! assert!(shard < 4);
//! assert_eq!(selector.shard_for_key(b"user:123"), shard);
//! ```

use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

use rustc_hash::FxHasher;

use crate::error::ConfigError;

/// Pluggable key hash: maps key bytes to a fixed-width fingerprint.
pub type HashFn = Arc<dyn Fn(&[u8]) -> u64 + Send + Sync>;

/// Default key hash: FxHash over the key bytes.
///
/// Deterministic across calls and across process runs.
///
/// ```
/// use memlru::ds::shard::default_hash;
///
/// assert_eq!(default_hash(b"abc"), default_hash(b"abc"));
/// assert_ne!(default_hash(b"abc"), default_hash(b"abd"));
/// ```
#[inline]
pub fn default_hash(key: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(key);
    hasher.finish()
}

/// Returns the default [`HashFn`].
pub fn default_hash_fn() -> HashFn {
    Arc::new(default_hash)
}

/// Deterministic shard selector over a power-of-two shard count.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use memlru::ds::ShardSelector;
///
/// // Route on the first key byte
/// let selector = ShardSelector::try_with_hash(8, Arc::new(|k: &[u8]| u64::from(k[0])))
///     .unwrap();
/// assert_eq!(selector.shard_for_key(b"\x09rest"), 1);
/// ```
#[derive(Clone)]
pub struct ShardSelector {
    mask: usize,
    hash: HashFn,
}

impl ShardSelector {
    /// Creates a selector for `shards` shards using [`default_hash`].
    ///
    /// # Panics
    ///
    /// Panics if `shards` is zero or not a power of two. For a non-panicking
    /// alternative, use [`try_with_hash`](Self::try_with_hash).
    pub fn new(shards: usize) -> Self {
        match Self::try_with_hash(shards, default_hash_fn()) {
            Ok(selector) => selector,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a selector with a custom hash function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ShardCount`] if `shards` is zero or not a power
    /// of two.
    pub fn try_with_hash(shards: usize, hash: HashFn) -> Result<Self, ConfigError> {
        if !shards.is_power_of_two() {
            return Err(ConfigError::ShardCount(shards));
        }
        Ok(Self {
            mask: shards - 1,
            hash,
        })
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.mask + 1
    }

    /// Maps a key to a shard index in `[0, shards)`.
    #[inline]
    pub fn shard_for_key(&self, key: &[u8]) -> usize {
        ((self.hash)(key) as usize) & self.mask
    }
}

impl fmt::Debug for ShardSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardSelector")
            .field("shards", &self.shard_count())
            .finish_non_exhaustive()
    }
}
