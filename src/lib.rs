//! memlru: a memory-bounded LRU cache for byte-string keys.
//!
//! Entries are charged a cost (by default `key.len() + value.weight()`) and
//! the cache evicts from the least recently used end, in configurable
//! batches, until the aggregate cost fits under `max_cost`. Entries too large
//! for the whole budget are dropped without disturbing the rest.
//!
//! - [`LruCache`]: single-threaded engine.
//! - [`ConcurrentLruCache`]: the same engine behind a `parking_lot::RwLock`.
//! - [`ShardedLruCache`]: a power-of-two number of concurrent shards, each
//!   with an equal slice of the budget.
//!
//! ```
//! use memlru::prelude::*;
//!
//! let mut cache: LruCache<Vec<u8>> = LruCache::new(1024);
//! cache.set(b"key", b"value".to_vec());
//! assert_eq!(cache.get(b"key").map(Vec::as_slice), Some(&b"value"[..]));
//! assert_eq!(cache.current_cost(), 8);
//! ```

pub mod builder;
pub mod ds;
pub mod error;
pub mod policy;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod traits;

pub use crate::builder::CacheBuilder;
pub use crate::ds::{IndexKind, ShardSelector, SlotArena, SlotId};
pub use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::CacheMetricsSnapshot;
pub use crate::policy::lru::{ConcurrentLruCache, LruCache};
pub use crate::policy::sharded::ShardedLruCache;
pub use crate::traits::{ConcurrentCache, Weigh};
