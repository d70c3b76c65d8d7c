//! Shared views: serialized writes and concurrent reads over any collection or map.
//!
//! A [`Shared`] (or [`SharedMap`]) owns the guard, never the locking logic of the wrapped
//! structure. Every single-step operation takes the guard for exactly that step: a read guard for
//! accessors (readers never block each other) and a write guard for mutators (writers serialize).
//!
//! Invariants:
//! -   Wrapping switches the structure to shared mode ([`Shareable::mark_shared`]), so nodes and
//!     entries removed while shared are retired instead of recycled.
//! -   Every mutating call reclaims the records it retired before releasing its write guard.
//!     Records retired through [`Shared::write`] wait for the next mutating call (or
//!     [`Shared::reclaim`]).
//! -   Iteration is **not** guarded automatically. Multi-step work such as iterating must hold
//!     [`Shared::read`] (or [`Shared::write`]) for its whole duration.
//! -   A [`SharedSubList`] validates the snapshot of its backing list before every access and
//!     fails with [`Error::ConcurrentStructuralChange`] if the list was modified through another
//!     path.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{check_index, check_position, check_range, Error, Result};
use crate::traits::{Collection, List, Map, Shareable};

/// Collection shared between threads behind a reader/writer guard.
pub struct Shared<C> {
    inner: Arc<RwLock<C>>,
}

impl<C> Clone for Shared<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Shareable> Shared<C> {
    /// Wraps `collection`, switching it to shared mode.
    pub fn new(mut collection: C) -> Self {
        collection.mark_shared();
        Self {
            inner: Arc::new(RwLock::new(collection)),
        }
    }

    /// Runs `f` under the write guard, then reclaims what it retired.
    fn modify<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        let mut collection = self.inner.write();
        let result = f(&mut *collection);
        collection.reclaim();
        result
    }

    /// Reclaims records retired through [`Shared::write`]. Returns how many were reclaimed.
    pub fn reclaim(&self) -> usize {
        self.inner.write().reclaim()
    }
}

impl<C> Shared<C> {
    /// Read guard for multi-step access, e.g. iteration.
    pub fn read(&self) -> RwLockReadGuard<'_, C> {
        self.inner.read()
    }

    /// Write guard for multi-step mutation.
    pub fn write(&self) -> RwLockWriteGuard<'_, C> {
        self.inner.write()
    }

    /// Unwraps the collection if this is the last handle to it.
    pub fn into_inner(self) -> std::result::Result<C, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<C: Collection + Shareable> Shared<C> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Returns `true` if an element equal to `value` is present.
    pub fn contains(&self, value: &C::Item) -> bool {
        self.inner.read().contains(value)
    }

    /// Adds an element.
    pub fn add(&self, value: C::Item) -> Result<bool> {
        self.modify(|collection| collection.add(value))
    }

    /// Removes the first element equal to `value`.
    pub fn remove_item(&self, value: &C::Item) -> Result<bool> {
        self.modify(|collection| collection.remove_item(value))
    }

    /// Removes all elements.
    pub fn clear(&self) -> Result<()> {
        self.modify(|collection| collection.clear())
    }

    /// Copies the elements out under a single read guard.
    pub fn to_vec(&self) -> Vec<C::Item>
    where
        C::Item: Clone,
    {
        self.inner.read().iter().cloned().collect()
    }
}

impl<C: List + Shareable> Shared<C> {
    /// Element at `index`, cloned out of the guard.
    pub fn get(&self, index: usize) -> Result<C::Item>
    where
        C::Item: Clone,
    {
        self.inner.read().get(index).cloned()
    }

    /// Replaces the element at `index`.
    pub fn set(&self, index: usize, value: C::Item) -> Result<C::Item> {
        self.modify(|list| list.set(index, value))
    }

    /// Inserts `value` at `index`.
    pub fn insert(&self, index: usize, value: C::Item) -> Result<()> {
        self.modify(|list| list.insert(index, value))
    }

    /// Removes the element at `index`.
    pub fn remove(&self, index: usize) -> Result<C::Item> {
        self.modify(|list| list.remove(index))
    }

    /// Index of the first element equal to `value`.
    pub fn index_of(&self, value: &C::Item) -> Option<usize> {
        self.inner.read().index_of(value)
    }

    /// Index of the last element equal to `value`.
    pub fn last_index_of(&self, value: &C::Item) -> Option<usize> {
        self.inner.read().last_index_of(value)
    }

    /// Detached view of `from..to`.
    ///
    /// The view remembers the snapshot of the list. Any structural change made through another
    /// path (including the parent `Shared` itself) invalidates the view.
    pub fn sub_list(&self, from: usize, to: usize) -> Result<SharedSubList<C>> {
        let list = self.inner.read();
        check_range(from, to, list.len())?;
        Ok(SharedSubList {
            inner: self.inner.clone(),
            from,
            len: to - from,
            expected: list.snapshot(),
        })
    }
}

impl<C: Debug> Debug for Shared<C> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_tuple("Shared").field(&*self.inner.read()).finish()
    }
}

/// Range of a shared list that outlives any single guard.
pub struct SharedSubList<C: List> {
    inner: Arc<RwLock<C>>,
    from: usize,
    len: usize,
    expected: C::Snapshot,
}

impl<C: List + Shareable> SharedSubList<C> {
    fn validate(&self, list: &C) -> Result<()> {
        if list.snapshot() == self.expected {
            Ok(())
        } else {
            Err(Error::ConcurrentStructuralChange)
        }
    }

    /// Number of elements in the range.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element at `index` within the range.
    pub fn get(&self, index: usize) -> Result<C::Item>
    where
        C::Item: Clone,
    {
        let list = self.inner.read();
        self.validate(&list)?;
        check_index(index, self.len)?;
        list.get(self.from + index).cloned()
    }

    /// Replaces the element at `index` within the range.
    pub fn set(&mut self, index: usize, value: C::Item) -> Result<C::Item> {
        let mut list = self.inner.write();
        self.validate(&list)?;
        check_index(index, self.len)?;
        let previous = list.set(self.from + index, value)?;
        self.expected = list.snapshot();
        Ok(previous)
    }

    /// Inserts `value` at `index` within the range, growing the range.
    pub fn insert(&mut self, index: usize, value: C::Item) -> Result<()> {
        let mut list = self.inner.write();
        self.validate(&list)?;
        check_position(index, self.len)?;
        list.insert(self.from + index, value)?;
        self.len += 1;
        self.expected = list.snapshot();
        Ok(())
    }

    /// Removes the element at `index` within the range, shrinking the range.
    pub fn remove(&mut self, index: usize) -> Result<C::Item> {
        let mut list = self.inner.write();
        self.validate(&list)?;
        check_index(index, self.len)?;
        let removed = list.remove(self.from + index)?;
        list.reclaim();
        self.len -= 1;
        self.expected = list.snapshot();
        Ok(removed)
    }

    /// Index within the range of the first element equal to `value`.
    pub fn index_of(&self, value: &C::Item) -> Result<Option<usize>> {
        let list = self.inner.read();
        self.validate(&list)?;
        Ok(list.index_of_range(value, self.from, self.from + self.len))
    }

    /// Copies the range out under a single read guard.
    pub fn to_vec(&self) -> Result<Vec<C::Item>>
    where
        C::Item: Clone,
    {
        let list = self.inner.read();
        self.validate(&list)?;
        Ok(list.iter().skip(self.from).take(self.len).cloned().collect())
    }
}

impl<C: List> Debug for SharedSubList<C> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("SharedSubList")
            .field("from", &self.from)
            .field("len", &self.len)
            .field("expected", &self.expected)
            .finish()
    }
}

/// Map shared between threads behind a reader/writer guard.
pub struct SharedMap<M> {
    inner: Arc<RwLock<M>>,
}

impl<M> Clone for SharedMap<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M: Shareable> SharedMap<M> {
    /// Wraps `map`, switching it to shared mode.
    pub fn new(mut map: M) -> Self {
        map.mark_shared();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Runs `f` under the write guard, then reclaims what it retired.
    fn modify<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        let mut map = self.inner.write();
        let result = f(&mut *map);
        map.reclaim();
        result
    }

    /// Reclaims records retired through [`SharedMap::write`]. Returns how many were reclaimed.
    pub fn reclaim(&self) -> usize {
        self.inner.write().reclaim()
    }
}

impl<M> SharedMap<M> {
    /// Read guard for multi-step access, e.g. iteration.
    pub fn read(&self) -> RwLockReadGuard<'_, M> {
        self.inner.read()
    }

    /// Write guard for multi-step mutation.
    pub fn write(&self) -> RwLockWriteGuard<'_, M> {
        self.inner.write()
    }

    /// Unwraps the map if this is the last handle to it.
    pub fn into_inner(self) -> std::result::Result<M, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<M: Map + Shareable> SharedMap<M> {
    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if there are no mappings.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Value for `key`, cloned out of the guard.
    pub fn get(&self, key: &M::Key) -> Option<M::Value>
    where
        M::Value: Clone,
    {
        self.inner.read().get(key).cloned()
    }

    /// Returns `true` if `key` is mapped.
    pub fn contains_key(&self, key: &M::Key) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Associates `value` with `key`.
    pub fn put(&self, key: M::Key, value: M::Value) -> Result<Option<M::Value>> {
        self.modify(|map| map.put(key, value))
    }

    /// Associates `value` with `key` unless it is mapped already. Returns the existing value.
    pub fn put_if_absent(&self, key: M::Key, value: M::Value) -> Result<Option<M::Value>>
    where
        M::Value: Clone,
    {
        self.modify(|map| Ok(map.put_if_absent(key, value)?.cloned()))
    }

    /// Removes the mapping for `key`.
    pub fn remove(&self, key: &M::Key) -> Result<Option<M::Value>> {
        self.modify(|map| map.remove(key))
    }

    /// Removes all mappings.
    pub fn clear(&self) -> Result<()> {
        self.modify(|map| map.clear())
    }

    /// Copies the mappings out, in insertion order, under a single read guard.
    pub fn to_vec(&self) -> Vec<(M::Key, M::Value)>
    where
        M::Key: Clone,
        M::Value: Clone,
    {
        self.inner
            .read()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl<M: Debug> Debug for SharedMap<M> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_tuple("SharedMap").field(&*self.inner.read()).finish()
    }
}
