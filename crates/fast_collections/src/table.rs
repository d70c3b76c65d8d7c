//! Growable array built from fixed-size blocks.
//!
//! A [`FastTable`] starts with a single low block of [`C0`] elements that doubles (by copying)
//! until it reaches [`C1`] elements. From then on the table grows by appending further blocks of
//! [`C1`] elements to its block table, so no growth step ever copies more than [`C1`] elements,
//! however large the table gets.
//!
//! Invariants:
//! -   `len <= capacity`.
//! -   While `capacity < C1` there is exactly one block, and it holds every element.
//! -   Once `capacity >= C1`, `capacity == blocks.len() * C1` and element `i` lives in
//!     `blocks[i >> B1][i & M1]`. All blocks before the one holding the last element are full.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Formatter};
use std::iter::Flatten;
use std::ops::{Index, IndexMut};
use std::{mem, slice, vec};

use crate::comparator::{Comparator, Direct, OrderComparator};
use crate::config::{B1, C0, C1, M1};
use crate::error::{check_index, check_position, check_range, Error, Result};
use crate::traits::{Collection, List, Shareable};

/// Indexable, growable array whose growth cost is bounded by a constant.
#[derive(Clone)]
pub struct FastTable<T, C = Direct> {
    blocks: Vec<Vec<T>>,
    capacity: usize,
    len: usize,
    shared: bool,
    comparator: C,
}

/// Identity of the storage of a [`FastTable`], see [`List::snapshot`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TableSnapshot {
    len: usize,
    low_block: usize,
}

impl<T> FastTable<T> {
    /// Creates an empty table with the default capacity and the [`Direct`] comparator.
    pub fn new() -> Self {
        Self::with_comparator(Direct::default())
    }

    /// Creates an empty table that can hold `capacity` elements before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, Direct::default())
    }
}

impl<T, C> FastTable<T, C> {
    /// Creates an empty table that compares its elements with `comparator`.
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_capacity_and_comparator(C0, comparator)
    }

    /// Creates an empty table with room for `capacity` elements.
    pub fn with_capacity_and_comparator(capacity: usize, comparator: C) -> Self {
        let mut low = C0;
        while low < capacity && low < C1 {
            low <<= 1;
        }
        let mut blocks = vec![Vec::with_capacity(low)];
        let mut total = low;
        while total < capacity {
            blocks.push(Vec::with_capacity(C1));
            total += C1;
        }
        Self {
            blocks,
            capacity: total,
            len: 0,
            shared: false,
            comparator,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no element.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the table can hold before it has to grow.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The value comparator.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    #[inline]
    fn at(&self, index: usize) -> &T {
        &self.blocks[index >> B1][index & M1]
    }

    #[inline]
    fn at_mut(&mut self, index: usize) -> &mut T {
        &mut self.blocks[index >> B1][index & M1]
    }

    /// Element at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Result<&T> {
        check_index(index, self.len)?;
        Ok(self.at(index))
    }

    /// Mutable element at `index`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        check_index(index, self.len)?;
        Ok(self.at_mut(index))
    }

    /// First element.
    pub fn first(&self) -> Result<&T> {
        if self.len == 0 {
            return Err(Error::NoSuchElement);
        }
        Ok(self.at(0))
    }

    /// Last element.
    pub fn last(&self) -> Result<&T> {
        if self.len == 0 {
            return Err(Error::NoSuchElement);
        }
        Ok(self.at(self.len - 1))
    }

    fn grow(&mut self) {
        if self.capacity < C1 {
            self.capacity <<= 1;
            let mut low = Vec::with_capacity(self.capacity);
            low.append(&mut self.blocks[0]);
            self.blocks[0] = low;
        } else {
            self.blocks.push(Vec::with_capacity(C1));
            self.capacity += C1;
            if self.blocks.len() == 2 {
                log::debug!("table outgrew its low block, growing by {C1} elements from now on");
            }
        }
    }

    /// Appends without consulting the comparator.
    fn push_admitted(&mut self, value: T) {
        if self.len == self.capacity {
            self.grow();
        }
        self.blocks[self.len >> B1].push(value);
        self.len += 1;
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Result<T> {
        if self.len == 0 {
            return Err(Error::NoSuchElement);
        }
        self.len -= 1;
        self.blocks[self.len >> B1].pop().ok_or(Error::NoSuchElement)
    }

    /// Removes and returns the element at `index`, shifting all later elements one to the left.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        check_index(index, self.len)?;
        let block = index >> B1;
        let removed = self.blocks[block].remove(index & M1);
        for next in block + 1..self.blocks.len() {
            if self.blocks[next].is_empty() {
                break;
            }
            let moved = self.blocks[next].remove(0);
            self.blocks[next - 1].push(moved);
        }
        self.len -= 1;
        Ok(removed)
    }

    /// Shortens the table to `len` elements. Does nothing if it is not longer than that.
    pub fn truncate(&mut self, len: usize) {
        while self.len > len {
            self.len -= 1;
            self.blocks[self.len >> B1].pop();
        }
    }

    /// Removes the elements in `from..to`.
    pub fn remove_range(&mut self, from: usize, to: usize) -> Result<()> {
        check_range(from, to, self.len)?;
        let count = to - from;
        if count == 0 {
            return Ok(());
        }
        // Shift the tail over the removed range, which collects the removed elements at the end.
        for i in from..self.len - count {
            self.swap_unchecked(i, i + count);
        }
        self.truncate(self.len - count);
        Ok(())
    }

    /// Swaps the elements at `a` and `b`.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        check_index(a, self.len)?;
        check_index(b, self.len)?;
        self.swap_unchecked(a, b);
        Ok(())
    }

    fn swap_unchecked(&mut self, a: usize, b: usize) {
        let (a_block, b_block) = (a >> B1, b >> B1);
        if a_block == b_block {
            self.blocks[a_block].swap(a & M1, b & M1);
        } else {
            let (low, high) = if a_block < b_block { (a, b) } else { (b, a) };
            let (left, right) = self.blocks.split_at_mut(high >> B1);
            mem::swap(&mut left[low >> B1][low & M1], &mut right[0][high & M1]);
        }
    }

    /// Removes all elements. The capacity is kept, see [`FastTable::trim`].
    pub fn clear(&mut self) {
        self.blocks.iter_mut().for_each(Vec::clear);
        self.len = 0;
    }

    /// Drops trailing blocks that hold no element, as long as more than one block of slack is
    /// left.
    pub fn trim(&mut self) {
        while self.capacity - self.len > C1 {
            self.blocks.pop();
            self.capacity -= C1;
        }
    }

    /// Iterates over the elements.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.blocks.iter().flatten(),
            remaining: self.len,
        }
    }

    /// Iterates mutably over the elements.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            inner: self.blocks.iter_mut().flatten(),
            remaining: self.len,
        }
    }

    /// Borrowed view of the elements `from..to`.
    pub fn sub_table(&self, from: usize, to: usize) -> Result<SubTable<'_, T, C>> {
        check_range(from, to, self.len)?;
        Ok(SubTable {
            table: self,
            from,
            len: to - from,
        })
    }

    fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            len: self.len,
            low_block: self.blocks[0].as_ptr() as usize,
        }
    }
}

impl<T, C: Comparator<T>> FastTable<T, C> {
    fn admit(&self, value: &T) -> Result<()> {
        if self.comparator.admits(value) {
            Ok(())
        } else {
            Err(Error::NullValue)
        }
    }

    /// Appends `value`.
    pub fn push(&mut self, value: T) -> Result<()> {
        self.admit(&value)?;
        self.push_admitted(value);
        Ok(())
    }

    /// Replaces the element at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        check_index(index, self.len)?;
        self.admit(&value)?;
        Ok(mem::replace(self.at_mut(index), value))
    }

    /// Inserts `value` at `index`, shifting all later elements one to the right.
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        check_position(index, self.len)?;
        self.admit(&value)?;
        if self.len == self.capacity {
            self.grow();
        }
        let block_capacity = self.capacity.min(C1);
        let mut carry = value;
        let mut block = index >> B1;
        let mut offset = index & M1;
        loop {
            let current = &mut self.blocks[block];
            if current.len() < block_capacity {
                current.insert(offset, carry);
                break;
            }
            // The block is full: its last element moves on to the front of the next block.
            let displaced = mem::replace(&mut current[block_capacity - 1], carry);
            current[offset..].rotate_right(1);
            carry = displaced;
            block += 1;
            offset = 0;
        }
        self.len += 1;
        Ok(())
    }

    /// Grows or shrinks the table to `len` elements, filling new slots with `fill()`.
    pub fn resize_with(&mut self, len: usize, mut fill: impl FnMut() -> T) -> Result<()> {
        self.truncate(len);
        while self.len < len {
            self.push(fill())?;
        }
        Ok(())
    }

    /// Index of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.iter().position(|e| self.comparator.are_equal(value, e))
    }

    /// Index of the last element equal to `value`.
    pub fn last_index_of(&self, value: &T) -> Option<usize> {
        (0..self.len)
            .rev()
            .find(|&i| self.comparator.are_equal(value, self.at(i)))
    }

    /// Returns `true` if an element equal to `value` is present.
    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }
}

impl<T, C: OrderComparator<T>> FastTable<T, C> {
    /// Sorts the table in place with the value comparator. Not stable.
    pub fn sort(&mut self) {
        if self.len > 1 {
            self.quicksort(0, self.len - 1);
        }
    }

    fn quicksort(&mut self, mut lo: usize, mut hi: usize) {
        while lo < hi {
            // Middle element as pivot, parked at `hi` while partitioning.
            self.swap_unchecked(lo + (hi - lo) / 2, hi);
            let mut store = lo;
            for i in lo..hi {
                if self.comparator.compare(self.at(i), self.at(hi)) == Ordering::Less {
                    self.swap_unchecked(i, store);
                    store += 1;
                }
            }
            self.swap_unchecked(store, hi);
            // Recurse into the smaller half, loop on the larger one.
            if store - lo < hi - store {
                if store > lo {
                    self.quicksort(lo, store - 1);
                }
                lo = store + 1;
            } else {
                if store < hi {
                    self.quicksort(store + 1, hi);
                }
                if store == lo {
                    break;
                }
                hi = store - 1;
            }
        }
    }
}

impl<T> Default for FastTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> Index<usize> for FastTable<T, C> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        assert!(index < self.len, "index {index} out of bounds for length {}", self.len);
        self.at(index)
    }
}

impl<T, C> IndexMut<usize> for FastTable<T, C> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        assert!(index < self.len, "index {index} out of bounds for length {}", self.len);
        self.at_mut(index)
    }
}

impl<T: Debug, C> Debug for FastTable<T, C> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, C, D> PartialEq<FastTable<T, D>> for FastTable<T, C> {
    fn eq(&self, other: &FastTable<T, D>) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq, C> Eq for FastTable<T, C> {}

impl<T, S> Extend<T> for FastTable<T, Direct<S>> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        // The direct comparator admits every value.
        for value in iter {
            self.push_admitted(value);
        }
    }
}

impl<T, S: Default> FromIterator<T> for FastTable<T, Direct<S>> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Self::with_comparator(Direct::default());
        table.extend(iter);
        table
    }
}

// Elements are stored inline, so there is nothing to retire in shared mode.
impl<T, C> Shareable for FastTable<T, C> {
    fn mark_shared(&mut self) {
        self.shared = true;
    }

    fn is_shared(&self) -> bool {
        self.shared
    }

    fn reclaim(&mut self) -> usize {
        0
    }
}

/// Iterator over the elements of a [`FastTable`].
pub struct Iter<'a, T> {
    inner: Flatten<slice::Iter<'a, Vec<T>>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let next = self.inner.next()?;
        self.remaining -= 1;
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let next = self.inner.next_back()?;
        self.remaining -= 1;
        Some(next)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Mutable iterator over the elements of a [`FastTable`].
pub struct IterMut<'a, T> {
    inner: Flatten<slice::IterMut<'a, Vec<T>>>,
    remaining: usize,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        let next = self.inner.next()?;
        self.remaining -= 1;
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let next = self.inner.next_back()?;
        self.remaining -= 1;
        Some(next)
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

/// Owning iterator over the elements of a [`FastTable`].
pub struct IntoIter<T> {
    inner: Flatten<vec::IntoIter<Vec<T>>>,
    remaining: usize,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let next = self.inner.next()?;
        self.remaining -= 1;
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        let next = self.inner.next_back()?;
        self.remaining -= 1;
        Some(next)
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T, C> IntoIterator for FastTable<T, C> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            inner: self.blocks.into_iter().flatten(),
            remaining: self.len,
        }
    }
}

impl<'a, T, C> IntoIterator for &'a FastTable<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, C> IntoIterator for &'a mut FastTable<T, C> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T, C: Comparator<T>> Collection for FastTable<T, C> {
    type Item = T;
    type Iter<'a>
        = Iter<'a, T>
    where
        Self: 'a;

    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> Iter<'_, T> {
        FastTable::iter(self)
    }

    fn contains(&self, value: &T) -> bool {
        FastTable::contains(self, value)
    }

    fn add(&mut self, value: T) -> Result<bool> {
        self.push(value)?;
        Ok(true)
    }

    fn remove_item(&mut self, value: &T) -> Result<bool> {
        match self.index_of(value) {
            Some(index) => {
                FastTable::remove(self, index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear(&mut self) -> Result<()> {
        FastTable::clear(self);
        Ok(())
    }
}

impl<T, C: Comparator<T>> List for FastTable<T, C> {
    type Snapshot = TableSnapshot;

    fn get(&self, index: usize) -> Result<&T> {
        FastTable::get(self, index)
    }

    fn set(&mut self, index: usize, value: T) -> Result<T> {
        FastTable::set(self, index, value)
    }

    fn insert(&mut self, index: usize, value: T) -> Result<()> {
        FastTable::insert(self, index, value)
    }

    fn remove(&mut self, index: usize) -> Result<T> {
        FastTable::remove(self, index)
    }

    fn index_of(&self, value: &T) -> Option<usize> {
        FastTable::index_of(self, value)
    }

    fn last_index_of(&self, value: &T) -> Option<usize> {
        FastTable::last_index_of(self, value)
    }

    fn index_of_range(&self, value: &T, from: usize, to: usize) -> Option<usize> {
        self.sub_table(from, to).ok()?.index_of(value)
    }

    fn snapshot(&self) -> TableSnapshot {
        FastTable::snapshot(self)
    }
}

/// Borrowed view of a contiguous range of a [`FastTable`].
pub struct SubTable<'a, T, C = Direct> {
    table: &'a FastTable<T, C>,
    from: usize,
    len: usize,
}

impl<'a, T, C> SubTable<'a, T, C> {
    /// Number of elements in the view.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element at `index`, relative to the start of the view.
    pub fn get(&self, index: usize) -> Result<&'a T> {
        check_index(index, self.len)?;
        Ok(self.table.at(self.from + index))
    }

    /// Iterates over the elements of the view.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &'a T> + ExactSizeIterator + 'a {
        let table = self.table;
        (self.from..self.from + self.len).map(move |i| table.at(i))
    }

    /// Narrower view of `from..to`, relative to the start of this view.
    pub fn sub_table(&self, from: usize, to: usize) -> Result<SubTable<'a, T, C>> {
        check_range(from, to, self.len)?;
        Ok(SubTable {
            table: self.table,
            from: self.from + from,
            len: to - from,
        })
    }
}

impl<T, C: Comparator<T>> SubTable<'_, T, C> {
    /// Index (relative to the view) of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.iter()
            .position(|e| self.table.comparator.are_equal(value, e))
    }

    /// Returns `true` if an element equal to `value` is in the view.
    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }
}

impl<T: Debug, C> Debug for SubTable<'_, T, C> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
