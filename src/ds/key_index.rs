//! Key → slot index with exact and hashed variants.
//!
//! ## Variants
//!
//! ```text
//!   Exact:   FxHashMap<Arc<[u8]>, SlotId>
//!            "user:1" ──► id_7
//!            "user:2" ──► id_3
//!
//!   Hashed:  FxHashMap<u64, Bucket>
//!            0x9f..01 ──► One(id_7)
//!            0x22..c4 ──► Chain[id_3, id_9]    (two keys, same hash)
//! ```
//!
//! The exact index compares key bytes inside the map and never aliases.
//!
//! The hashed index keys its map by a fixed-width fingerprint. Two distinct
//! keys can share a fingerprint, so every slot stays in a chained bucket and
//! [`KeyIndex::lookup`] asks the caller to confirm the stored key before
//! reporting a hit. A fingerprint match alone is never a hit.
//!
//! The map key of the exact index shares its allocation with the key stored
//! in the slot (`Arc<[u8]>`), so exact-indexed bytes are held once. The
//! hashed index stores only the fingerprint; the slot still owns a copy of
//! the key for verification.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::ds::shard::HashFn;
use crate::ds::slot_arena::SlotId;

/// Which index layout a cache uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Map keyed by the literal key bytes.
    #[default]
    Exact,
    /// Map keyed by a key fingerprint, verified against the stored key.
    Hashed,
}

#[derive(Debug)]
enum Bucket {
    One(SlotId),
    Chain(Vec<SlotId>),
}

impl Bucket {
    fn ids(&self) -> &[SlotId] {
        match self {
            Bucket::One(id) => std::slice::from_ref(id),
            Bucket::Chain(ids) => ids,
        }
    }

    fn push(&mut self, id: SlotId) {
        match self {
            Bucket::One(existing) => *self = Bucket::Chain(vec![*existing, id]),
            Bucket::Chain(ids) => ids.push(id),
        }
    }

    /// Drops `id`; returns `true` if the bucket is now empty.
    fn remove(&mut self, id: SlotId) -> bool {
        match self {
            Bucket::One(existing) => *existing == id,
            Bucket::Chain(ids) => {
                ids.retain(|&other| other != id);
                match ids.as_slice() {
                    [] => true,
                    [last] => {
                        *self = Bucket::One(*last);
                        false
                    },
                    _ => false,
                }
            },
        }
    }
}

/// Hash-keyed index with collision chaining.
pub struct HashedIndex {
    map: FxHashMap<u64, Bucket>,
    hash: HashFn,
    len: usize,
}

impl HashedIndex {
    pub fn new(hash: HashFn) -> Self {
        Self {
            map: FxHashMap::default(),
            hash,
            len: 0,
        }
    }

    /// Number of fingerprints currently holding more than one slot.
    pub fn collided_buckets(&self) -> usize {
        self.map
            .values()
            .filter(|bucket| matches!(bucket, Bucket::Chain(_)))
            .count()
    }
}

impl std::fmt::Debug for HashedIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashedIndex")
            .field("map", &self.map)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Key index used by the cache engine.
#[derive(Debug)]
pub enum KeyIndex {
    Exact(FxHashMap<Arc<[u8]>, SlotId>),
    Hashed(HashedIndex),
}

impl KeyIndex {
    /// Creates an empty index of the given kind.
    ///
    /// `hash` is only consulted by [`IndexKind::Hashed`].
    pub fn new(kind: IndexKind, hash: HashFn) -> Self {
        match kind {
            IndexKind::Exact => KeyIndex::Exact(FxHashMap::default()),
            IndexKind::Hashed => KeyIndex::Hashed(HashedIndex::new(hash)),
        }
    }

    pub fn kind(&self) -> IndexKind {
        match self {
            KeyIndex::Exact(_) => IndexKind::Exact,
            KeyIndex::Hashed(_) => IndexKind::Hashed,
        }
    }

    /// Resolves `key` to its slot.
    ///
    /// `stored_key_matches(id)` must report whether the slot behind `id`
    /// holds exactly `key`. The hashed index calls it for every candidate in
    /// the bucket and returns a miss if none match.
    #[inline]
    pub fn lookup(
        &self,
        key: &[u8],
        stored_key_matches: impl Fn(SlotId) -> bool,
    ) -> Option<SlotId> {
        match self {
            KeyIndex::Exact(map) => map.get(key).copied(),
            KeyIndex::Hashed(index) => {
                let bucket = index.map.get(&(index.hash)(key))?;
                bucket
                    .ids()
                    .iter()
                    .copied()
                    .find(|&id| stored_key_matches(id))
            },
        }
    }

    /// Records `key → id`. The caller guarantees `key` is not already present.
    pub fn insert(&mut self, key: &Arc<[u8]>, id: SlotId) {
        match self {
            KeyIndex::Exact(map) => {
                let previous = map.insert(Arc::clone(key), id);
                debug_assert!(previous.is_none(), "key indexed twice");
            },
            KeyIndex::Hashed(index) => {
                let fingerprint = (index.hash)(&key[..]);
                match index.map.get_mut(&fingerprint) {
                    Some(bucket) => bucket.push(id),
                    None => {
                        index.map.insert(fingerprint, Bucket::One(id));
                    },
                }
                index.len += 1;
            },
        }
    }

    /// Drops the mapping for `key`, which must currently resolve to `id`.
    ///
    /// Returns `false` if nothing was removed.
    pub fn remove(&mut self, key: &[u8], id: SlotId) -> bool {
        match self {
            KeyIndex::Exact(map) => match map.get(key) {
                Some(&current) if current == id => {
                    map.remove(key);
                    true
                },
                _ => false,
            },
            KeyIndex::Hashed(index) => {
                let fingerprint = (index.hash)(key);
                let Some(bucket) = index.map.get_mut(&fingerprint) else {
                    return false;
                };
                if !bucket.ids().contains(&id) {
                    return false;
                }
                if bucket.remove(id) {
                    index.map.remove(&fingerprint);
                }
                index.len -= 1;
                true
            },
        }
    }

    /// Number of indexed keys.
    pub fn len(&self) -> usize {
        match self {
            KeyIndex::Exact(map) => map.len(),
            KeyIndex::Hashed(index) => index.len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match self {
            KeyIndex::Exact(map) => map.clear(),
            KeyIndex::Hashed(index) => {
                index.map.clear();
                index.len = 0;
            },
        }
    }

    /// Every indexed slot id, in no particular order.
    pub fn slot_ids(&self) -> Box<dyn Iterator<Item = SlotId> + '_> {
        match self {
            KeyIndex::Exact(map) => Box::new(map.values().copied()),
            KeyIndex::Hashed(index) => Box::new(
                index
                    .map
                    .values()
                    .flat_map(|bucket| bucket.ids().iter().copied()),
            ),
        }
    }
}
