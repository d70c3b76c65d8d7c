//! Pool of reusable node/entry records.
//!
//! Linked structures in this crate never hold references to their nodes. They hold `u32` slot
//! indices into a [`NodePool`], and hand out generation-checked [`Handle`]s to callers. Releasing a
//! record bumps the generation of its slot, so a handle that outlived its record resolves to
//! nothing instead of to whatever record reuses the slot.
//!
//! Invariants:
//! -   Records live in fixed-size blocks. Growing the pool appends a block (or extends the last
//!     one up to its fixed capacity); existing records are never moved or copied.
//! -   Every slot is in exactly one state: occupied, on the free list, or retired.
//! -   Retired slots are never handed out again until [`NodePool::reclaim_retired`] is called.

use std::fmt::{self, Debug, Formatter};

use crate::config::PoolConfig;

/// Slots per block, in bits.
const BLOCK_BITS: u32 = 8;
const BLOCK_LEN: usize = 1 << BLOCK_BITS;
const BLOCK_MASK: usize = BLOCK_LEN - 1;

/// End-of-chain marker for the free and retired lists.
pub(crate) const NIL: u32 = u32::MAX;

/// Stable, generation-checked reference to a pooled record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Slot index of the record.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

enum State<T> {
    Occupied(T),
    Free { next: u32 },
    Retired { next: u32 },
}

struct Slot<T> {
    generation: u32,
    state: State<T>,
}

/// Supplies pre-allocated, reusable records and takes released records back onto a free list.
pub struct NodePool<T> {
    blocks: Vec<Vec<Slot<T>>>,
    slot_count: usize,
    free_head: u32,
    free_len: usize,
    retired_head: u32,
    retired_len: usize,
    live: usize,
    batch: usize,
}

impl<T> NodePool<T> {
    /// Creates a pool, allocating `config.initial` records up front.
    pub fn new(config: PoolConfig) -> Self {
        let mut pool = Self {
            blocks: Vec::new(),
            slot_count: 0,
            free_head: NIL,
            free_len: 0,
            retired_head: NIL,
            retired_len: 0,
            live: 0,
            batch: config.batch.max(1),
        };
        pool.reserve(config.initial);
        pool
    }

    /// Number of occupied records.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no record is occupied.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of records waiting on the free list.
    pub fn free_len(&self) -> usize {
        self.free_len
    }

    /// Number of records retired in shared mode and not yet reclaimed.
    pub fn retired_len(&self) -> usize {
        self.retired_len
    }

    /// Total number of records ever allocated by this pool.
    pub fn capacity(&self) -> usize {
        self.slot_count
    }

    /// Allocates `n` fresh records onto the free list.
    ///
    /// The new records are handed out in increasing slot order.
    pub fn reserve(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let first = self.slot_count;
        assert!(
            first + n < NIL as usize,
            "node pool exceeds {} records",
            NIL
        );
        for i in 0..n {
            let index = first + i;
            // Link each new slot to its successor; the last one continues the old free list.
            let next = if i + 1 < n {
                (index + 1) as u32
            } else {
                self.free_head
            };
            self.push_slot(Slot {
                generation: 0,
                state: State::Free { next },
            });
        }
        self.free_head = first as u32;
        self.free_len += n;
    }

    fn push_slot(&mut self, slot: Slot<T>) {
        match self.blocks.last_mut() {
            Some(block) if block.len() < BLOCK_LEN => block.push(slot),
            _ => {
                let mut block = Vec::with_capacity(BLOCK_LEN);
                block.push(slot);
                self.blocks.push(block);
            }
        }
        self.slot_count += 1;
    }

    #[inline]
    fn slot(&self, index: u32) -> &Slot<T> {
        let index = index as usize;
        &self.blocks[index >> BLOCK_BITS][index & BLOCK_MASK]
    }

    #[inline]
    fn slot_mut(&mut self, index: u32) -> &mut Slot<T> {
        let index = index as usize;
        &mut self.blocks[index >> BLOCK_BITS][index & BLOCK_MASK]
    }

    /// Takes a record from the free list (allocating a batch if it is empty) and stores `value`.
    pub fn allocate(&mut self, value: T) -> Handle {
        if self.free_head == NIL {
            self.reserve(self.batch);
        }
        let index = self.free_head;
        let slot = self.slot_mut(index);
        let next = match slot.state {
            State::Free { next } => next,
            _ => unreachable!("free list points at a slot that is not free"),
        };
        slot.state = State::Occupied(value);
        let generation = slot.generation;
        self.free_head = next;
        self.free_len -= 1;
        self.live += 1;
        Handle { index, generation }
    }

    /// Returns the record behind `handle` to the free list, handing back its value.
    ///
    /// Returns `None` (and does nothing) if the handle is stale.
    pub fn release(&mut self, handle: Handle) -> Option<T> {
        let value = self.vacate(handle, State::Free { next: self.free_head })?;
        self.free_head = handle.index;
        self.free_len += 1;
        Some(value)
    }

    /// Drops the record behind `handle` without making its slot reusable.
    ///
    /// Used in shared mode: a reader still walking through the record must never observe it
    /// resurrected with a different value.
    pub fn retire(&mut self, handle: Handle) -> Option<T> {
        let value = self.vacate(handle, State::Retired { next: self.retired_head })?;
        self.retired_head = handle.index;
        self.retired_len += 1;
        Some(value)
    }

    fn vacate(&mut self, handle: Handle, new_state: State<T>) -> Option<T> {
        let slot = self.slot_mut(handle.index);
        if slot.generation != handle.generation || !matches!(slot.state, State::Occupied(_)) {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        match std::mem::replace(&mut slot.state, new_state) {
            State::Occupied(value) => {
                self.live -= 1;
                Some(value)
            }
            _ => unreachable!("checked above"),
        }
    }

    /// Moves every retired slot back onto the free list. Returns how many were reclaimed.
    pub fn reclaim_retired(&mut self) -> usize {
        let reclaimed = self.retired_len;
        let mut index = self.retired_head;
        while index != NIL {
            let free_head = self.free_head;
            let slot = self.slot_mut(index);
            let next = match slot.state {
                State::Retired { next } => next,
                _ => unreachable!("retired list points at a slot that is not retired"),
            };
            slot.state = State::Free { next: free_head };
            self.free_head = index;
            index = next;
        }
        self.retired_head = NIL;
        self.retired_len = 0;
        self.free_len += reclaimed;
        if reclaimed > 0 {
            log::trace!("reclaimed {reclaimed} retired pool records");
        }
        reclaimed
    }

    /// Resolves a handle. Returns `None` if the record was released or retired since.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        if handle.index as usize >= self.slot_count {
            return None;
        }
        match self.slot(handle.index) {
            Slot {
                generation,
                state: State::Occupied(value),
            } if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    /// Mutable version of [`NodePool::get`].
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if handle.index as usize >= self.slot_count {
            return None;
        }
        match self.slot_mut(handle.index) {
            Slot {
                generation,
                state: State::Occupied(value),
            } if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    /// Returns `true` if `handle` still refers to a live record.
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Records at `indices`, which must be strictly increasing and occupied.
    ///
    /// # Panics
    ///
    /// If one of the slots is not occupied.
    pub(crate) fn at_many_mut(&mut self, indices: &[u32]) -> Vec<&mut T> {
        let mut records = Vec::with_capacity(indices.len());
        let mut pending = indices.iter().map(|&index| index as usize).peekable();
        for (number, block) in self.blocks.iter_mut().enumerate() {
            let mut slots = block.iter_mut();
            let mut position = 0;
            while let Some(index) = pending.next_if(|index| index >> BLOCK_BITS == number) {
                let offset = index & BLOCK_MASK;
                match slots.nth(offset - position) {
                    Some(Slot {
                        state: State::Occupied(value),
                        ..
                    }) => records.push(value),
                    _ => panic!("dangling pool index {index}"),
                }
                position = offset + 1;
            }
            if pending.peek().is_none() {
                break;
            }
        }
        records
    }

    /// Current handle for an occupied slot.
    pub(crate) fn handle_at(&self, index: u32) -> Handle {
        Handle {
            index,
            generation: self.slot(index).generation,
        }
    }

    /// Record at an index the caller knows to be occupied.
    ///
    /// # Panics
    ///
    /// If the slot is not occupied. Linked structures only store indices of live records, so this
    /// indicates a broken link.
    #[inline]
    pub(crate) fn at(&self, index: u32) -> &T {
        match &self.slot(index).state {
            State::Occupied(value) => value,
            _ => panic!("dangling pool index {index}"),
        }
    }

    /// Mutable version of [`NodePool::at`].
    #[inline]
    pub(crate) fn at_mut(&mut self, index: u32) -> &mut T {
        match &mut self.slot_mut(index).state {
            State::Occupied(value) => value,
            _ => panic!("dangling pool index {index}"),
        }
    }
}

impl<T> Default for NodePool<T> {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl<T> Debug for NodePool<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("NodePool")
            .field("live", &self.live)
            .field("free", &self.free_len)
            .field("retired", &self.retired_len)
            .field("capacity", &self.slot_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_in_batches() {
        let mut pool = NodePool::new(PoolConfig::sequence());
        assert_eq!(pool.capacity(), 0);
        let a = pool.allocate("a");
        assert_eq!(pool.capacity(), 4);
        assert_eq!(pool.free_len(), 3);
        let handles: Vec<_> = ["b", "c", "d"].into_iter().map(|v| pool.allocate(v)).collect();
        assert_eq!(pool.capacity(), 4);
        assert_eq!(
            handles.iter().map(|h| h.index()).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        pool.allocate("e");
        assert_eq!(pool.capacity(), 8);
        assert_eq!(pool.len(), 5);
        assert_eq!(pool.get(a), Some(&"a"));
    }

    #[test]
    fn released_records_are_reused_and_stale_handles_fail() {
        let mut pool = NodePool::new(PoolConfig::map());
        let a = pool.allocate(1);
        assert_eq!(pool.release(a), Some(1));
        assert_eq!(pool.release(a), None);
        let b = pool.allocate(2);
        assert_eq!(b.index(), a.index());
        assert_ne!(b.generation(), a.generation());
        assert_eq!(pool.get(a), None);
        assert_eq!(pool.get(b), Some(&2));
        *pool.get_mut(b).unwrap() = 3;
        assert_eq!(pool.at(b.index()), &3);
    }

    #[test]
    fn retired_records_wait_for_reclaim() {
        let mut pool = NodePool::new(PoolConfig::new(1, 0));
        let a = pool.allocate('a');
        assert_eq!(pool.retire(a), Some('a'));
        assert_eq!(pool.retired_len(), 1);
        let b = pool.allocate('b');
        assert_ne!(a.index(), b.index());
        assert_eq!(pool.reclaim_retired(), 1);
        let c = pool.allocate('c');
        assert_eq!(c.index(), a.index());
        assert!(!pool.contains(a));
    }

    #[test]
    fn growth_spans_blocks() {
        let mut pool = NodePool::new(PoolConfig::new(100, 0));
        let handles: Vec<_> = (0..1000).map(|i| pool.allocate(i)).collect();
        assert!(pool.capacity() >= 1000);
        for (i, h) in handles.iter().enumerate() {
            assert_eq!(pool.get(*h), Some(&i));
        }
    }

    #[test]
    fn many_records_across_blocks() {
        let mut pool = NodePool::new(PoolConfig::new(100, 0));
        let handles: Vec<_> = (0..600usize).map(|i| pool.allocate(i)).collect();
        let mut indices: Vec<u32> = handles.iter().step_by(7).map(Handle::index).collect();
        indices.sort_unstable();
        let before: Vec<usize> = indices.iter().map(|&index| *pool.at(index)).collect();
        for record in pool.at_many_mut(&indices) {
            *record += 1000;
        }
        for (&index, value) in indices.iter().zip(before) {
            assert_eq!(pool.at(index), &(value + 1000));
        }
        assert_eq!(pool.get(handles[1]), Some(&1));
    }
}
