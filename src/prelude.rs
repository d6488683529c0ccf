pub use crate::builder::CacheBuilder;
pub use crate::ds::IndexKind;
pub use crate::error::ConfigError;
pub use crate::policy::lru::{ConcurrentLruCache, LruCache};
pub use crate::policy::sharded::ShardedLruCache;
pub use crate::traits::{ConcurrentCache, Weigh};
