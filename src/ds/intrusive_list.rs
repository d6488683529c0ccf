//! Intrusive doubly linked list backed by `SlotArena`.
//!
//! Stores list nodes in a `SlotArena` and links them by `SlotId`, enabling
//! stable handles and O(1) splice/move operations without pointer chasing.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<Node<T>>)
//!   ┌────────┬─────────────────────────────────────────────┐
//!   │ SlotId │ Node { value, prev, next }                  │
//!   ├────────┼─────────────────────────────────────────────┤
//!   │ id_1   │ { value: A, prev: None, next: Some(id_2) }  │
//!   │ id_2   │ { value: B, prev: Some(id_1), next: id_3 }  │
//!   │ id_3   │ { value: C, prev: Some(id_2), next: None }  │
//!   └────────┴─────────────────────────────────────────────┘
//!
//!   head ─► [id_1] ◄──► [id_2] ◄──► [id_3] ◄── tail
//!   (MRU)                                     (LRU)
//! ```
//!
//! A node lives in the arena exactly as long as it is linked: `push_front`
//! allocates and links in one step, `remove` and `pop_back` unlink and free in
//! one step. There is no public way to hold a detached-but-allocated node, so
//! a slot can not be released while a neighbour still points at it.
//!
//! ## Operations
//! - `push_front(value)`: allocate + attach at head
//! - `move_to_front(id)`: detach + attach at head
//! - `pop_back()`: detach tail + free slot
//! - `remove(id)`: detach + free slot
//!
//! ## Performance
//! - `push_front` / `pop_back` / `remove`: O(1)
//! - `move_to_front`: O(1)
//! - `iter`: O(n)
//!
//! `check_links()` walks the whole list and reports the first broken link.

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

#[derive(Debug)]
/// Intrusive list that stores nodes in a `SlotArena` and links them via `SlotId`.
pub struct IntrusiveList<T> {
    arena: SlotArena<Node<T>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<T> IntrusiveList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            arena: SlotArena::new(),
            head: None,
            tail: None,
        }
    }

    /// Creates an empty list with reserved node capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    /// Returns the number of nodes in the list.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Returns `true` if `id` is currently a node in this list.
    pub fn contains(&self, id: SlotId) -> bool {
        self.arena.contains(id)
    }

    /// Returns the SlotId at the front (MRU) of the list.
    pub fn front_id(&self) -> Option<SlotId> {
        self.head
    }

    /// Returns the SlotId at the back (LRU) of the list.
    pub fn back_id(&self) -> Option<SlotId> {
        self.tail
    }

    /// Returns the value at the back (LRU) of the list.
    pub fn back(&self) -> Option<&T> {
        self.tail
            .and_then(|id| self.arena.get(id).map(|node| &node.value))
    }

    /// Number of arena slots ever allocated (live + recycled).
    pub fn slot_count(&self) -> usize {
        self.arena.slot_count()
    }

    /// Returns an iterator from front to back.
    pub fn iter(&self) -> IntrusiveListIter<'_, T> {
        IntrusiveListIter {
            list: self,
            current: self.head,
        }
    }

    /// Returns an iterator of `(SlotId, &T)` from front to back.
    pub fn iter_entries(&self) -> IntrusiveListEntryIter<'_, T> {
        IntrusiveListEntryIter {
            list: self,
            current: self.head,
        }
    }

    /// Returns the value for a node id, if present.
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.arena.get(id).map(|node| &node.value)
    }

    /// Returns a mutable reference to a node value, if present.
    ///
    /// Links are untouched; this is the in-place mutation path.
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.arena.get_mut(id).map(|node| &mut node.value)
    }

    /// Inserts a new node at the front and returns its `SlotId`.
    pub fn push_front(&mut self, value: T) -> SlotId {
        let id = self.arena.insert(Node {
            value,
            prev: None,
            next: self.head,
        });
        if let Some(head) = self.head {
            if let Some(node) = self.arena.get_mut(head) {
                node.prev = Some(id);
            }
        } else {
            self.tail = Some(id);
        }
        self.head = Some(id);
        id
    }

    /// Removes the back node and returns it with the id it had.
    ///
    /// The returned id is already stale.
    pub fn pop_back(&mut self) -> Option<(SlotId, T)> {
        let id = self.tail?;
        self.remove(id).map(|value| (id, value))
    }

    /// Removes the node `id` from the list and returns its value.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        self.detach(id)?;
        self.arena.remove(id).map(|node| node.value)
    }

    /// Moves an existing node to the front; returns `false` if `id` is not present.
    pub fn move_to_front(&mut self, id: SlotId) -> bool {
        if !self.arena.contains(id) {
            return false;
        }
        if Some(id) == self.head {
            return true;
        }
        self.detach(id);
        self.attach_front(id);
        true
    }

    /// Clears the list and frees all nodes.
    ///
    /// Ids issued before the clear stay stale forever.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    fn detach(&mut self, id: SlotId) -> Option<()> {
        let (prev, next) = {
            let node = self.arena.get(id)?;
            (node.prev, node.next)
        };

        if let Some(prev_id) = prev {
            if let Some(prev_node) = self.arena.get_mut(prev_id) {
                prev_node.next = next;
            }
        } else {
            self.head = next;
        }

        if let Some(next_id) = next {
            if let Some(next_node) = self.arena.get_mut(next_id) {
                next_node.prev = prev;
            }
        } else {
            self.tail = prev;
        }

        if let Some(node) = self.arena.get_mut(id) {
            node.prev = None;
            node.next = None;
        }

        Some(())
    }

    fn attach_front(&mut self, id: SlotId) -> Option<()> {
        let old_head = self.head;
        if let Some(node) = self.arena.get_mut(id) {
            node.prev = None;
            node.next = old_head;
        } else {
            return None;
        }
        if let Some(old_head) = old_head {
            if let Some(head_node) = self.arena.get_mut(old_head) {
                head_node.prev = Some(id);
            }
        } else {
            self.tail = Some(id);
        }
        self.head = Some(id);
        Some(())
    }

    /// Walks head to tail and verifies the structural invariants.
    ///
    /// Checks that `head` and `tail` are both set or both unset, that every
    /// `a.next == b` has a matching `b.prev == a`, that the walk ends at
    /// `tail` without revisiting a node, and that it visits exactly `len()`
    /// nodes.
    pub fn check_links(&self) -> Result<(), InvariantError> {
        if self.head.is_none() || self.tail.is_none() {
            if self.head.is_some() || self.tail.is_some() || !self.is_empty() {
                return Err(InvariantError::new(format!(
                    "list endpoints inconsistent: head={:?} tail={:?} len={}",
                    self.head,
                    self.tail,
                    self.len()
                )));
            }
            return Ok(());
        }

        let mut count = 0usize;
        let mut current = self.head;
        let mut prev = None;

        while let Some(id) = current {
            count += 1;
            if count > self.len() {
                return Err(InvariantError::new(format!(
                    "list walk exceeded len {} (cycle through {:?})",
                    self.len(),
                    id
                )));
            }
            let node = self
                .arena
                .get(id)
                .ok_or_else(|| InvariantError::new(format!("stale SlotId {:?} linked", id)))?;
            if node.prev != prev {
                return Err(InvariantError::new(format!(
                    "node {:?} prev is {:?}, expected {:?}",
                    id, node.prev, prev
                )));
            }
            if node.next.is_none() && self.tail != Some(id) {
                return Err(InvariantError::new(format!(
                    "walk ended at {:?} but tail is {:?}",
                    id, self.tail
                )));
            }
            prev = Some(id);
            current = node.next;
        }

        if count != self.len() {
            return Err(InvariantError::new(format!(
                "list walk visited {} nodes, len is {}",
                count,
                self.len()
            )));
        }
        Ok(())
    }
}

pub struct IntrusiveListIter<'a, T> {
    list: &'a IntrusiveList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for IntrusiveListIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.arena.get(id)?;
        self.current = node.next;
        Some(&node.value)
    }
}

/// Iterator over `(SlotId, &T)` pairs from front to back.
pub struct IntrusiveListEntryIter<'a, T> {
    list: &'a IntrusiveList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for IntrusiveListEntryIter<'a, T> {
    type Item = (SlotId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.arena.get(id)?;
        self.current = node.next;
        Some((id, &node.value))
    }
}

impl<T> Default for IntrusiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}
