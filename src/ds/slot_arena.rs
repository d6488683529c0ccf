//! Generational slot arena with free-list reuse.
//!
//! Backing storage for the recency list. Slots are appended on demand and
//! recycled through a LIFO free list, so a cache that churns at steady state
//! stops growing once it has seen its peak population.
//!
//! ## Handles
//!
//! ```text
//!   SlotId { index: 2, generation: 5 }
//!            │
//!            ▼
//!   slots: [ g3:Some(A) | g0:None | g5:Some(C) | g1:Some(D) ]
//!                                   ▲
//!                        generation must match
//! ```
//!
//! Every removal bumps the slot's generation. A `SlotId` issued before the
//! removal keeps the old generation and resolves to `None` from then on, even
//! after the index has been reissued to a different value. `SlotId` has no
//! public constructor; the only way to obtain one is [`SlotArena::insert`].
//!
//! ## Performance
//! - `insert` / `remove` / `get`: O(1)
//! - `iter`: O(slots), including vacant ones

/// Opaque handle to a live slot in a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: usize,
    generation: u64,
}

impl SlotId {
    /// Position of the slot inside the arena.
    pub fn index(self) -> usize {
        self.index
    }

    /// Generation the slot had when this handle was issued.
    pub fn generation(self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    generation: u64,
}

#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Stores `value`, reusing the most recently freed slot if there is one.
    pub fn insert(&mut self, value: T) -> SlotId {
        let index = if let Some(index) = self.free_list.pop() {
            self.slots[index].value = Some(value);
            index
        } else {
            self.slots.push(Slot {
                value: Some(value),
                generation: 0,
            });
            self.slots.len() - 1
        };
        self.len += 1;
        SlotId {
            index,
            generation: self.slots[index].generation,
        }
    }

    /// Frees the slot behind `id` and returns its value.
    ///
    /// Returns `None` for stale or already-freed handles.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots allocated so far, live or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Drops every value and invalidates every outstanding `SlotId`.
    ///
    /// Slots stay allocated and go back on the free list.
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_list.push(index);
        }
        self.len = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    SlotId {
                        index,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
