//! Capability traits shared by the collections and their views.
//!
//! The concrete structures ([`FastTable`], [`FastSequence`], [`FastMap`], [`FastSet`]) implement
//! these traits on top of their inherent methods. The views ([`Unmodifiable`], and the facades in
//! [`shared`](crate::shared)) are written against the traits only, so any structure can be
//! decorated without the structure knowing about it.
//!
//! Mutators return [`Result`] because a view may refuse them ([`Error::Unsupported`]).
//!
//! [`FastTable`]: crate::FastTable
//! [`FastSequence`]: crate::FastSequence
//! [`FastMap`]: crate::FastMap
//! [`FastSet`]: crate::FastSet
//! [`Unmodifiable`]: crate::Unmodifiable
//! [`Error::Unsupported`]: crate::Error::Unsupported

use std::fmt::Debug;

use crate::Result;

/// A sized, iterable group of elements.
pub trait Collection {
    /// Element type.
    type Item;

    /// Iterator over the elements, in the collection's natural order.
    type Iter<'a>: Iterator<Item = &'a Self::Item>
    where
        Self: 'a;

    /// Number of elements.
    fn len(&self) -> usize;

    /// Returns `true` if there are no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the elements.
    fn iter(&self) -> Self::Iter<'_>;

    /// Returns `true` if an element equal to `value` (per the collection's comparator) is present.
    fn contains(&self, value: &Self::Item) -> bool;

    /// Adds an element. Returns `false` if the collection did not change (e.g. set semantics).
    fn add(&mut self, value: Self::Item) -> Result<bool>;

    /// Removes the first element equal to `value`. Returns `true` if one was removed.
    fn remove_item(&mut self, value: &Self::Item) -> Result<bool>;

    /// Removes all elements.
    fn clear(&mut self) -> Result<()>;
}

/// A collection with positional access.
pub trait List: Collection {
    /// Cheap identity of the backing storage, compared by detached views to detect structural
    /// changes made through another path.
    type Snapshot: Copy + Eq + Debug;

    /// Element at `index`.
    fn get(&self, index: usize) -> Result<&Self::Item>;

    /// Replaces the element at `index`, returning the previous one.
    fn set(&mut self, index: usize, value: Self::Item) -> Result<Self::Item>;

    /// Inserts `value` at `index`, shifting subsequent elements.
    fn insert(&mut self, index: usize, value: Self::Item) -> Result<()>;

    /// Removes and returns the element at `index`, shifting subsequent elements.
    fn remove(&mut self, index: usize) -> Result<Self::Item>;

    /// Index of the first element equal to `value`.
    fn index_of(&self, value: &Self::Item) -> Option<usize>;

    /// Index of the last element equal to `value`.
    fn last_index_of(&self, value: &Self::Item) -> Option<usize>;

    /// Index, relative to `from`, of the first element of `from..to` equal to `value`. `None` if
    /// there is none or the range is invalid.
    fn index_of_range(&self, value: &Self::Item, from: usize, to: usize) -> Option<usize>;

    /// Current identity of the backing storage.
    fn snapshot(&self) -> Self::Snapshot;
}

/// Key/value association.
pub trait Map {
    /// Key type.
    type Key;
    /// Value type.
    type Value;

    /// Iterator over key/value pairs, in insertion order.
    type Iter<'a>: Iterator<Item = (&'a Self::Key, &'a Self::Value)>
    where
        Self: 'a;

    /// Number of mappings.
    fn len(&self) -> usize;

    /// Returns `true` if there are no mappings.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value associated with `key`.
    fn get(&self, key: &Self::Key) -> Option<&Self::Value>;

    /// Returns `true` if `key` is mapped.
    fn contains_key(&self, key: &Self::Key) -> bool {
        self.get(key).is_some()
    }

    /// Associates `value` with `key`, returning the previous value.
    fn put(&mut self, key: Self::Key, value: Self::Value) -> Result<Option<Self::Value>>;

    /// Associates `value` with `key` only if `key` is not mapped yet. Returns the existing value
    /// if there was one (in which case nothing changed).
    fn put_if_absent(
        &mut self,
        key: Self::Key,
        value: Self::Value,
    ) -> Result<Option<&Self::Value>>;

    /// Removes the mapping for `key`, returning its value.
    fn remove(&mut self, key: &Self::Key) -> Result<Option<Self::Value>>;

    /// Removes all mappings.
    fn clear(&mut self) -> Result<()>;

    /// Iterates over the mappings in insertion order.
    fn iter(&self) -> Self::Iter<'_>;
}

/// Structures that behave differently once shared between threads.
///
/// In shared mode, removed nodes and entries are retired instead of recycled, so a reader that
/// still holds a handle never sees the record come back with a different value. Retired records
/// stay out of circulation until [`Shareable::reclaim`] is called.
pub trait Shareable {
    /// Switches the structure to shared mode.
    fn mark_shared(&mut self);

    /// Returns `true` once [`Shareable::mark_shared`] was called.
    fn is_shared(&self) -> bool;

    /// Makes retired records reusable again. Returns how many were reclaimed.
    ///
    /// Call it only while no reader is inside the structure, e.g. under a write guard.
    fn reclaim(&mut self) -> usize;
}
