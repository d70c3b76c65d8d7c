//! Doubly-linked sequence with pooled nodes.
//!
//! The nodes of a [`FastSequence`] live in a [`NodePool`] and link to each other by slot index.
//! Two permanent sentinel nodes, `head` and `tail`, bracket the live chain and never carry a value,
//! so insertion and removal never special-case the ends.
//!
//! Invariants:
//! -   Following `next` from `head` exactly `len` times reaches the last live node, and one more
//!     step reaches `tail`. The same holds backwards through `prev`.
//! -   Only the two sentinels have `value == None`.
//! -   A node removed in unshared mode goes back to the pool's free list and is reused by the next
//!     insertion. In shared mode it is retired instead and never reused until
//!     [`FastSequence::reclaim`] is called.

use std::fmt::{self, Debug, Formatter};

use crate::comparator::{Comparator, Direct};
use crate::config::PoolConfig;
use crate::error::{check_index, check_position, check_range, Error, Result};
use crate::pool::{Handle, NodePool};
use crate::traits::{Collection, List, Shareable};

struct Node<T> {
    value: Option<T>,
    prev: u32,
    next: u32,
}

/// Stable reference to a node of a [`FastSequence`].
///
/// A `NodeRef` stays valid until its node is deleted. After that, every operation taking it
/// reports [`Error::NoSuchElement`] (or returns `None`), even if the pool slot was reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeRef(Handle);

impl NodeRef {
    /// The pool handle behind this reference.
    pub fn handle(&self) -> Handle {
        self.0
    }
}

/// Identity of the chain of a [`FastSequence`], see [`List::snapshot`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SequenceSnapshot {
    len: usize,
    first: Handle,
}

/// Doubly-linked list with head and tail sentinels and pooled, reusable nodes.
pub struct FastSequence<T, C = Direct> {
    pool: NodePool<Node<T>>,
    head: u32,
    tail: u32,
    len: usize,
    shared: bool,
    comparator: C,
}

impl<T> FastSequence<T> {
    /// Creates an empty sequence with the [`Direct`] comparator.
    pub fn new() -> Self {
        Self::with_comparator(Direct::default())
    }
}

impl<T, C> FastSequence<T, C> {
    /// Creates an empty sequence that compares its elements with `comparator`.
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_config(PoolConfig::sequence(), comparator)
    }

    /// Creates an empty sequence whose node pool follows `config`.
    pub fn with_config(config: PoolConfig, comparator: C) -> Self {
        let mut pool = NodePool::new(config);
        let head = pool
            .allocate(Node {
                value: None,
                prev: 0,
                next: 0,
            })
            .index();
        let tail = pool
            .allocate(Node {
                value: None,
                prev: head,
                next: head,
            })
            .index();
        pool.at_mut(head).next = tail;
        pool.at_mut(head).prev = tail;
        Self {
            pool,
            head,
            tail,
            len: 0,
            shared: false,
            comparator,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the sequence holds no element.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The value comparator.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// The head sentinel. Its successor is the first element.
    pub fn head(&self) -> NodeRef {
        NodeRef(self.pool.handle_at(self.head))
    }

    /// The tail sentinel. Its predecessor is the last element. Inserting before it appends.
    pub fn tail(&self) -> NodeRef {
        NodeRef(self.pool.handle_at(self.tail))
    }

    fn is_sentinel(&self, index: u32) -> bool {
        index == self.head || index == self.tail
    }

    /// Resolves `node` to the index of a live, non-sentinel node.
    fn live_index(&self, node: NodeRef) -> Result<u32> {
        let index = node.0.index();
        if self.pool.contains(node.0) && !self.is_sentinel(index) {
            Ok(index)
        } else {
            Err(Error::NoSuchElement)
        }
    }

    fn node_ref(&self, index: u32) -> NodeRef {
        NodeRef(self.pool.handle_at(index))
    }

    /// Node following `node`, or `None` at the end of the chain or if `node` was deleted.
    pub fn next(&self, node: NodeRef) -> Option<NodeRef> {
        let next = self.pool.get(node.0)?.next;
        (node.0.index() != self.tail && next != self.tail).then(|| self.node_ref(next))
    }

    /// Node preceding `node`, or `None` at the start of the chain or if `node` was deleted.
    pub fn previous(&self, node: NodeRef) -> Option<NodeRef> {
        let prev = self.pool.get(node.0)?.prev;
        (node.0.index() != self.head && prev != self.head).then(|| self.node_ref(prev))
    }

    /// Value of `node`. `None` for sentinels and deleted nodes.
    pub fn value(&self, node: NodeRef) -> Option<&T> {
        self.pool.get(node.0)?.value.as_ref()
    }

    /// Mutable value of `node`. `None` for sentinels and deleted nodes.
    pub fn value_mut(&mut self, node: NodeRef) -> Option<&mut T> {
        self.pool.get_mut(node.0)?.value.as_mut()
    }

    fn value_at(&self, index: u32) -> &T {
        match &self.pool.at(index).value {
            Some(value) => value,
            None => panic!("sentinel {index} inside the live chain"),
        }
    }

    /// First element.
    pub fn first(&self) -> Result<&T> {
        if self.len == 0 {
            return Err(Error::NoSuchElement);
        }
        Ok(self.value_at(self.pool.at(self.head).next))
    }

    /// Last element.
    pub fn last(&self) -> Result<&T> {
        if self.len == 0 {
            return Err(Error::NoSuchElement);
        }
        Ok(self.value_at(self.pool.at(self.tail).prev))
    }

    /// Links a new node holding `value` right before the node at `at`.
    fn link_before(&mut self, at: u32, value: T) -> u32 {
        let prev = self.pool.at(at).prev;
        let index = self
            .pool
            .allocate(Node {
                value: Some(value),
                prev,
                next: at,
            })
            .index();
        self.pool.at_mut(prev).next = index;
        self.pool.at_mut(at).prev = index;
        self.len += 1;
        index
    }

    /// Unlinks the live node at `index` and hands its record back to the pool.
    fn unlink(&mut self, index: u32) -> Result<T> {
        let (prev, next) = {
            let node = self.pool.at(index);
            (node.prev, node.next)
        };
        self.pool.at_mut(prev).next = next;
        self.pool.at_mut(next).prev = prev;
        self.len -= 1;
        let handle = self.pool.handle_at(index);
        let node = if self.shared {
            self.pool.retire(handle)
        } else {
            self.pool.release(handle)
        };
        node.and_then(|node| node.value).ok_or(Error::NoSuchElement)
    }

    /// Removes and returns the first element.
    pub fn pop_front(&mut self) -> Result<T> {
        if self.len == 0 {
            return Err(Error::NoSuchElement);
        }
        self.unlink(self.pool.at(self.head).next)
    }

    /// Removes and returns the last element.
    pub fn pop_back(&mut self) -> Result<T> {
        if self.len == 0 {
            return Err(Error::NoSuchElement);
        }
        self.unlink(self.pool.at(self.tail).prev)
    }

    /// Removes `node` from the sequence and returns its value.
    pub fn delete_node(&mut self, node: NodeRef) -> Result<T> {
        let index = self.live_index(node)?;
        self.unlink(index)
    }

    /// Walks to position `i` of a range of `len` nodes bracketed by `before` and `after`,
    /// starting from whichever end is closer.
    fn walk(&self, before: u32, after: u32, len: usize, i: usize) -> u32 {
        if i < len / 2 {
            let mut index = self.pool.at(before).next;
            for _ in 0..i {
                index = self.pool.at(index).next;
            }
            index
        } else {
            let mut index = self.pool.at(after).prev;
            for _ in i + 1..len {
                index = self.pool.at(index).prev;
            }
            index
        }
    }

    /// Node at position `index`, walking from the nearer end.
    pub fn node_at(&self, index: usize) -> Result<NodeRef> {
        check_index(index, self.len)?;
        Ok(self.node_ref(self.walk(self.head, self.tail, self.len, index)))
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Result<&T> {
        check_index(index, self.len)?;
        Ok(self.value_at(self.walk(self.head, self.tail, self.len, index)))
    }

    /// Mutable element at `index`.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let node = self.node_at(index)?;
        self.value_mut(node).ok_or(Error::NoSuchElement)
    }

    /// Removes and returns the element at `index`.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        check_index(index, self.len)?;
        let index = self.walk(self.head, self.tail, self.len, index);
        self.unlink(index)
    }

    /// Removes all elements.
    pub fn clear(&mut self) {
        let mut index = self.pool.at(self.head).next;
        while index != self.tail {
            let next = self.pool.at(index).next;
            let handle = self.pool.handle_at(index);
            if self.shared {
                self.pool.retire(handle);
            } else {
                self.pool.release(handle);
            }
            index = next;
        }
        self.pool.at_mut(self.head).next = self.tail;
        self.pool.at_mut(self.tail).prev = self.head;
        self.len = 0;
    }

    /// Makes nodes retired in shared mode reusable again. Returns how many were reclaimed.
    ///
    /// Only call this while no reader is walking the chain. [`NodeRef`]s to removed nodes stay
    /// invalid after the slots are reused.
    pub fn reclaim(&mut self) -> usize {
        self.pool.reclaim_retired()
    }

    /// Iterates over the elements from first to last.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            pool: &self.pool,
            front: self.pool.at(self.head).next,
            back: self.pool.at(self.tail).prev,
            remaining: self.len,
        }
    }

    /// Borrowed view of the elements `from..to`.
    pub fn sub_list(&self, from: usize, to: usize) -> Result<SubSequence<'_, T, C>> {
        check_range(from, to, self.len)?;
        let before = match from {
            0 => self.head,
            _ => self.walk(self.head, self.tail, self.len, from - 1),
        };
        let after = if to == self.len {
            self.tail
        } else {
            self.walk(self.head, self.tail, self.len, to)
        };
        Ok(SubSequence {
            sequence: self,
            before,
            after,
            len: to - from,
        })
    }

    fn snapshot(&self) -> SequenceSnapshot {
        SequenceSnapshot {
            len: self.len,
            first: self.pool.handle_at(self.pool.at(self.head).next),
        }
    }
}

impl<T, C: Comparator<T>> FastSequence<T, C> {
    fn admit(&self, value: &T) -> Result<()> {
        if self.comparator.admits(value) {
            Ok(())
        } else {
            Err(Error::NullValue)
        }
    }

    /// Prepends `value`.
    pub fn push_front(&mut self, value: T) -> Result<NodeRef> {
        self.admit(&value)?;
        let first = self.pool.at(self.head).next;
        let index = self.link_before(first, value);
        Ok(self.node_ref(index))
    }

    /// Appends `value`.
    pub fn push_back(&mut self, value: T) -> Result<NodeRef> {
        self.admit(&value)?;
        let index = self.link_before(self.tail, value);
        Ok(self.node_ref(index))
    }

    /// Inserts `value` right before `node`. Passing [`FastSequence::tail`] appends.
    pub fn insert_before(&mut self, node: NodeRef, value: T) -> Result<NodeRef> {
        let at = node.0.index();
        if !self.pool.contains(node.0) || at == self.head {
            return Err(Error::NoSuchElement);
        }
        self.admit(&value)?;
        let index = self.link_before(at, value);
        Ok(self.node_ref(index))
    }

    /// Inserts `value` at position `index`.
    pub fn insert(&mut self, index: usize, value: T) -> Result<NodeRef> {
        check_position(index, self.len)?;
        self.admit(&value)?;
        let at = if index == self.len {
            self.tail
        } else {
            self.walk(self.head, self.tail, self.len, index)
        };
        let index = self.link_before(at, value);
        Ok(self.node_ref(index))
    }

    /// Replaces the element at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        self.admit(&value)?;
        let slot = self.get_mut(index)?;
        Ok(std::mem::replace(slot, value))
    }

    fn find(&self, value: &T) -> Option<u32> {
        let mut index = self.pool.at(self.head).next;
        while index != self.tail {
            if self.comparator.are_equal(value, self.value_at(index)) {
                return Some(index);
            }
            index = self.pool.at(index).next;
        }
        None
    }

    /// Position of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.iter().position(|e| self.comparator.are_equal(value, e))
    }

    /// Position of the last element equal to `value`.
    pub fn last_index_of(&self, value: &T) -> Option<usize> {
        self.iter()
            .rev()
            .position(|e| self.comparator.are_equal(value, e))
            .map(|from_back| self.len - 1 - from_back)
    }

    /// Returns `true` if an element equal to `value` is present.
    pub fn contains(&self, value: &T) -> bool {
        self.find(value).is_some()
    }
}

impl<T> Default for FastSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, C: Clone> Clone for FastSequence<T, C> {
    fn clone(&self) -> Self {
        let config = PoolConfig::sequence().with_initial(self.len + 2);
        let mut clone = Self::with_config(config, self.comparator.clone());
        for value in self.iter() {
            clone.link_before(clone.tail, value.clone());
        }
        clone.shared = self.shared;
        clone
    }
}

impl<T: Debug, C> Debug for FastSequence<T, C> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, C, D> PartialEq<FastSequence<T, D>> for FastSequence<T, C> {
    fn eq(&self, other: &FastSequence<T, D>) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq, C> Eq for FastSequence<T, C> {}

impl<T, S> Extend<T> for FastSequence<T, Direct<S>> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.link_before(self.tail, value);
        }
    }
}

impl<T, S: Default> FromIterator<T> for FastSequence<T, Direct<S>> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut sequence = Self::with_comparator(Direct::default());
        sequence.extend(iter);
        sequence
    }
}

impl<T, C> Shareable for FastSequence<T, C> {
    fn mark_shared(&mut self) {
        self.shared = true;
    }

    fn is_shared(&self) -> bool {
        self.shared
    }

    fn reclaim(&mut self) -> usize {
        self.pool.reclaim_retired()
    }
}

/// Iterator over the elements of a [`FastSequence`] (or of a [`SubSequence`]).
pub struct Iter<'a, T> {
    pool: &'a NodePool<Node<T>>,
    front: u32,
    back: u32,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.pool.at(self.front);
        self.front = node.next;
        self.remaining -= 1;
        node.value.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.pool.at(self.back);
        self.back = node.prev;
        self.remaining -= 1;
        node.value.as_ref()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T, C> IntoIterator for &'a FastSequence<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Owning iterator over the elements of a [`FastSequence`].
pub struct IntoIter<T, C> {
    sequence: FastSequence<T, C>,
}

impl<T, C> Iterator for IntoIter<T, C> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.sequence.pop_front().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.sequence.len, Some(self.sequence.len))
    }
}

impl<T, C> DoubleEndedIterator for IntoIter<T, C> {
    fn next_back(&mut self) -> Option<T> {
        self.sequence.pop_back().ok()
    }
}

impl<T, C> ExactSizeIterator for IntoIter<T, C> {}

impl<T, C> IntoIterator for FastSequence<T, C> {
    type Item = T;
    type IntoIter = IntoIter<T, C>;

    fn into_iter(self) -> IntoIter<T, C> {
        IntoIter { sequence: self }
    }
}

impl<T, C: Comparator<T>> Collection for FastSequence<T, C> {
    type Item = T;
    type Iter<'a>
        = Iter<'a, T>
    where
        Self: 'a;

    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> Iter<'_, T> {
        FastSequence::iter(self)
    }

    fn contains(&self, value: &T) -> bool {
        FastSequence::contains(self, value)
    }

    fn add(&mut self, value: T) -> Result<bool> {
        self.push_back(value)?;
        Ok(true)
    }

    fn remove_item(&mut self, value: &T) -> Result<bool> {
        match self.find(value) {
            Some(index) => {
                self.unlink(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear(&mut self) -> Result<()> {
        FastSequence::clear(self);
        Ok(())
    }
}

impl<T, C: Comparator<T>> List for FastSequence<T, C> {
    type Snapshot = SequenceSnapshot;

    fn get(&self, index: usize) -> Result<&T> {
        FastSequence::get(self, index)
    }

    fn set(&mut self, index: usize, value: T) -> Result<T> {
        FastSequence::set(self, index, value)
    }

    fn insert(&mut self, index: usize, value: T) -> Result<()> {
        FastSequence::insert(self, index, value).map(|_| ())
    }

    fn remove(&mut self, index: usize) -> Result<T> {
        FastSequence::remove(self, index)
    }

    fn index_of(&self, value: &T) -> Option<usize> {
        FastSequence::index_of(self, value)
    }

    fn last_index_of(&self, value: &T) -> Option<usize> {
        FastSequence::last_index_of(self, value)
    }

    fn index_of_range(&self, value: &T, from: usize, to: usize) -> Option<usize> {
        self.sub_list(from, to).ok()?.index_of(value)
    }

    fn snapshot(&self) -> SequenceSnapshot {
        FastSequence::snapshot(self)
    }
}

/// Borrowed view of a contiguous range of a [`FastSequence`].
///
/// Positional access walks from whichever end of the range is closer.
pub struct SubSequence<'a, T, C = Direct> {
    sequence: &'a FastSequence<T, C>,
    before: u32,
    after: u32,
    len: usize,
}

impl<'a, T, C> SubSequence<'a, T, C> {
    /// Number of elements in the view.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Node at `index`, relative to the start of the view.
    pub fn node_at(&self, index: usize) -> Result<NodeRef> {
        check_index(index, self.len)?;
        let node = self.sequence.walk(self.before, self.after, self.len, index);
        Ok(self.sequence.node_ref(node))
    }

    /// Element at `index`, relative to the start of the view.
    pub fn get(&self, index: usize) -> Result<&'a T> {
        check_index(index, self.len)?;
        let sequence = self.sequence;
        Ok(sequence.value_at(sequence.walk(self.before, self.after, self.len, index)))
    }

    /// Iterates over the elements of the view.
    pub fn iter(&self) -> Iter<'a, T> {
        let sequence = self.sequence;
        let pool = &sequence.pool;
        Iter {
            pool,
            front: pool.at(self.before).next,
            back: pool.at(self.after).prev,
            remaining: self.len,
        }
    }
}

impl<T, C: Comparator<T>> SubSequence<'_, T, C> {
    /// Position (relative to the view) of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.iter()
            .position(|e| self.sequence.comparator.are_equal(value, e))
    }

    /// Returns `true` if an element equal to `value` is in the view.
    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }
}

impl<T: Debug, C> Debug for SubSequence<'_, T, C> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn behaves_like_a_deque() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut sequence = FastSequence::new();
        let mut model = VecDeque::new();
        for step in 0..10_000u32 {
            match rng.random_range(0..6) {
                0 | 1 => {
                    sequence.push_front(step).unwrap();
                    model.push_front(step);
                }
                2 | 3 => {
                    sequence.push_back(step).unwrap();
                    model.push_back(step);
                }
                4 => assert_eq!(sequence.pop_front().ok(), model.pop_front()),
                _ => assert_eq!(sequence.pop_back().ok(), model.pop_back()),
            }
            assert_eq!(sequence.len(), model.len());
            assert_eq!(sequence.first().ok(), model.front());
            assert_eq!(sequence.last().ok(), model.back());
        }
        for (i, expected) in model.iter().enumerate() {
            let node = sequence.node_at(i).unwrap();
            assert_eq!(sequence.value(node), Some(expected));
            assert_eq!(sequence.get(i).unwrap(), expected);
        }
        assert!(sequence.iter().rev().eq(model.iter().rev()));
    }

    #[test]
    fn empty_sequence_errors() {
        let mut sequence = FastSequence::<u8>::new();
        assert!(matches!(sequence.first(), Err(Error::NoSuchElement)));
        assert!(matches!(sequence.last(), Err(Error::NoSuchElement)));
        assert!(matches!(sequence.pop_front(), Err(Error::NoSuchElement)));
        assert!(matches!(sequence.pop_back(), Err(Error::NoSuchElement)));
        assert!(matches!(
            sequence.node_at(0),
            Err(Error::IndexOutOfBounds { index: 0, len: 0 })
        ));
        let head = sequence.head();
        assert!(matches!(
            sequence.delete_node(head),
            Err(Error::NoSuchElement)
        ));
    }

    #[test]
    fn nodes_come_in_batches_and_are_reused() {
        let mut sequence = FastSequence::new();
        sequence.push_back('a').unwrap();
        let b = sequence.push_back('b').unwrap();
        // Two sentinels plus two elements fill the first burst of four.
        assert_eq!(sequence.pool.capacity(), 4);
        sequence.push_back('c').unwrap();
        assert_eq!(sequence.pool.capacity(), 8);

        assert_eq!(sequence.delete_node(b).unwrap(), 'b');
        assert!(matches!(sequence.delete_node(b), Err(Error::NoSuchElement)));
        let d = sequence.push_back('d').unwrap();
        assert_eq!(d.handle().index(), b.handle().index());
        assert_eq!(sequence.value(b), None);
        assert_eq!(sequence.iter().collect::<String>(), "acd");
    }

    #[test]
    fn shared_mode_retires_removed_nodes() {
        let mut sequence: FastSequence<u32> = (0..4).collect();
        sequence.mark_shared();
        let first = sequence.node_at(0).unwrap();
        sequence.delete_node(first).unwrap();
        let fresh = sequence.push_back(4).unwrap();
        assert_ne!(fresh.handle().index(), first.handle().index());
        assert_eq!(sequence.pool.retired_len(), 1);
        sequence.clear();
        assert_eq!(sequence.pool.retired_len(), 5);
        assert_eq!(sequence.reclaim(), 5);
        assert!(sequence.is_empty());
    }

    #[test]
    fn navigation_and_insert_before() {
        let mut sequence: FastSequence<u32> = [1, 3].into_iter().collect();
        let three = sequence.node_at(1).unwrap();
        let two = sequence.insert_before(three, 2).unwrap();
        let tail = sequence.tail();
        sequence.insert_before(tail, 4).unwrap();
        assert_eq!(format!("{sequence:?}"), "[1, 2, 3, 4]");

        let head = sequence.head();
        let first = sequence.next(head).unwrap();
        assert_eq!(sequence.value(first), Some(&1));
        assert_eq!(sequence.next(first), Some(two));
        assert_eq!(sequence.previous(first), None);
        let last = sequence.previous(tail).unwrap();
        assert_eq!(sequence.value(last), Some(&4));
        assert_eq!(sequence.next(last), None);
        assert_eq!(sequence.value(head), None);
        assert!(matches!(
            sequence.insert_before(head, 0),
            Err(Error::NoSuchElement)
        ));

        *sequence.value_mut(two).unwrap() = 20;
        assert_eq!(sequence.index_of(&20), Some(1));
    }

    #[test]
    fn positional_edits() {
        let mut sequence: FastSequence<u32> = (0..10).collect();
        sequence.insert(10, 10).unwrap();
        sequence.insert(0, 100).unwrap();
        assert_eq!(sequence.remove(5).unwrap(), 4);
        assert_eq!(sequence.set(0, 99).unwrap(), 100);
        assert_eq!(
            sequence.iter().copied().collect::<Vec<_>>(),
            vec![99, 0, 1, 2, 3, 5, 6, 7, 8, 9, 10]
        );
        sequence.push_back(3).unwrap();
        assert_eq!(sequence.last_index_of(&3), Some(11));
        assert!(Collection::remove_item(&mut sequence, &3).unwrap());
        assert_eq!(sequence.index_of(&3), Some(10));
        assert!(sequence.insert(13, 0).is_err());
    }

    #[test]
    fn sub_lists_walk_from_the_nearer_end() {
        let sequence: FastSequence<u32> = (0..100).collect();
        let sub = sequence.sub_list(10, 30).unwrap();
        assert_eq!(sub.len(), 20);
        for i in 0..20 {
            assert_eq!(sub.get(i).unwrap(), &(10 + i as u32));
        }
        let node = sub.node_at(19).unwrap();
        assert_eq!(sequence.value(node), Some(&29));
        assert!(sub.iter().rev().copied().eq((10..30).rev()));
        assert_eq!(sub.index_of(&15), Some(5));
        assert!(sub.get(20).is_err());
        assert!(sequence.sub_list(90, 101).is_err());
        assert!(sequence.sub_list(100, 100).unwrap().is_empty());
    }

    #[test]
    fn owned_iteration_and_clone() {
        let sequence: FastSequence<String> =
            ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        let copy = sequence.clone();
        assert_eq!(copy, sequence);
        let mut owned = sequence.into_iter();
        assert_eq!(owned.next_back().as_deref(), Some("z"));
        assert_eq!(owned.collect::<Vec<_>>(), vec!["x", "y"]);
    }
}
