//! # Cache Traits
//!
//! Two small seams: how a value reports its cost, and what a thread-safe
//! byte-keyed cache looks like from the outside.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────┐      ┌───────────────────────────────────┐
//!   │           Weigh               │      │       ConcurrentCache<V>          │
//!   │                               │      │                                   │
//!   │  weight(&) → usize            │      │  get(&, key) → Option<Arc<V>>     │
//!   │                               │      │  set(&, key, V)                   │
//!   │  used by the default cost     │      │  delete(&, key) → Option<Arc<V>>  │
//!   │  len(key) + value.weight()    │      │  current_cost(&) → usize          │
//!   └───────────────────────────────┘      │  max_cost(&) → usize              │
//!                                          │  len(&) / is_empty(&)             │
//!                                          └─────────────────┬─────────────────┘
//!                                                            │
//!                                    ┌───────────────────────┴────────────────────┐
//!                                    ▼                                            ▼
//!                       ConcurrentLruCache<V>                          ShardedLruCache<V>
//!                       (one lock, one budget)                         (N locks, N budgets)
//! ```
//!
//! The single-threaded [`LruCache`](crate::policy::lru::LruCache) is not
//! behind a trait: it hands out `&V` borrows, which the lock-holding engines
//! can not do. They share values as `Arc<V>` instead.

use std::borrow::Cow;
use std::rc::Rc;
use std::sync::Arc;

/// Capability for values that can report their memory cost in bytes.
///
/// The default cost function charges `key.len() + value.weight()`. Types
/// that do not implement `Weigh` can still be cached by supplying a custom
/// cost function to the builder.
///
/// # Example
///
/// ```
/// use memlru::traits::Weigh;
///
/// struct Blob {
///     header: [u8; 16],
///     body: Vec<u8>,
/// }
///
/// impl Weigh for Blob {
///     fn weight(&self) -> usize {
///         self.header.len() + self.body.len()
///     }
/// }
///
/// let blob = Blob { header: [0; 16], body: vec![0; 100] };
/// assert_eq!(blob.weight(), 116);
/// assert_eq!(b"abc".to_vec().weight(), 3);
/// ```
pub trait Weigh {
    /// Cost of this value in bytes (or any abstract unit shared with the budget).
    fn weight(&self) -> usize;
}

impl Weigh for [u8] {
    #[inline]
    fn weight(&self) -> usize {
        self.len()
    }
}

impl<const N: usize> Weigh for [u8; N] {
    #[inline]
    fn weight(&self) -> usize {
        N
    }
}

impl Weigh for Vec<u8> {
    #[inline]
    fn weight(&self) -> usize {
        self.len()
    }
}

impl Weigh for str {
    #[inline]
    fn weight(&self) -> usize {
        self.len()
    }
}

impl Weigh for String {
    #[inline]
    fn weight(&self) -> usize {
        self.len()
    }
}

impl<T: Weigh + ?Sized> Weigh for &T {
    #[inline]
    fn weight(&self) -> usize {
        (**self).weight()
    }
}

impl<T: Weigh + ?Sized> Weigh for Box<T> {
    #[inline]
    fn weight(&self) -> usize {
        (**self).weight()
    }
}

impl<T: Weigh + ?Sized> Weigh for Arc<T> {
    #[inline]
    fn weight(&self) -> usize {
        (**self).weight()
    }
}

impl<T: Weigh + ?Sized> Weigh for Rc<T> {
    #[inline]
    fn weight(&self) -> usize {
        (**self).weight()
    }
}

impl<T> Weigh for Cow<'_, T>
where
    T: Weigh + ToOwned + ?Sized,
{
    #[inline]
    fn weight(&self) -> usize {
        (**self).weight()
    }
}

/// Thread-safe, cost-bounded cache keyed by byte strings.
///
/// Every method takes `&self`; implementors synchronise internally. Values
/// are stored behind `Arc`, so `get` only bumps a reference count.
///
/// # Example
///
/// ```
/// use memlru::policy::lru::ConcurrentLruCache;
/// use memlru::policy::sharded::ShardedLruCache;
/// use memlru::traits::ConcurrentCache;
///
/// fn warm<C: ConcurrentCache<Vec<u8>>>(cache: &C) {
///     cache.set(b"greeting", b"hello".to_vec());
/// }
///
/// let single = ConcurrentLruCache::new(1024);
/// let sharded = ShardedLruCache::new(4, 1024);
/// warm(&single);
/// warm(&sharded);
/// assert_eq!(single.get(b"greeting").as_deref(), Some(&b"hello".to_vec()));
/// assert_eq!(sharded.get(b"greeting").as_deref(), Some(&b"hello".to_vec()));
/// ```
pub trait ConcurrentCache<V>: Send + Sync {
    /// Returns the shared value and marks the entry most recently used.
    fn get(&self, key: &[u8]) -> Option<Arc<V>>;

    /// Inserts or replaces the value, evicting from the LRU end as needed.
    ///
    /// An entry whose cost exceeds the whole budget is silently refused; a
    /// value already stored under the key stays.
    fn set(&self, key: &[u8], value: V);

    /// Removes the key, returning its value if it was present.
    fn delete(&self, key: &[u8]) -> Option<Arc<V>>;

    /// Aggregate cost of all live entries.
    fn current_cost(&self) -> usize;

    /// Cost budget enforced after every `set`.
    fn max_cost(&self) -> usize;

    /// Number of live entries.
    fn len(&self) -> usize;

    /// Returns `true` if the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_containers_weigh_their_length() {
        assert_eq!(b"abcd"[..].weight(), 4);
        assert_eq!([0u8; 7].weight(), 7);
        assert_eq!(vec![1u8, 2, 3].weight(), 3);
        assert_eq!(Box::<[u8]>::from(&b"xy"[..]).weight(), 2);
        assert_eq!(Arc::<[u8]>::from(&b"xyz"[..]).weight(), 3);
    }

    #[test]
    fn strings_weigh_their_utf8_length() {
        assert_eq!("héllo".weight(), 6);
        assert_eq!(String::from("abc").weight(), 3);
        assert_eq!(Arc::<str>::from("abcd").weight(), 4);
        assert_eq!(Cow::Borrowed("ab").weight(), 2);
        assert_eq!(Cow::<str>::Owned("abc".into()).weight(), 3);
    }

    #[test]
    fn references_forward_to_the_target() {
        let v = vec![0u8; 10];
        let r = &v;
        assert_eq!(r.weight(), 10);
        assert_eq!(Rc::new(v).weight(), 10);
    }
}
