//! Insertion-ordered set, a [`FastMap`] with unit values.

use std::fmt::{self, Debug, Formatter};
use std::hash::{BuildHasher, Hash};

use crate::comparator::{Comparator, Direct};
use crate::error::Result;
use crate::map::{self, FastMap, MapStatistics};
use crate::traits::{Collection, Shareable};

/// Set that iterates in insertion order.
pub struct FastSet<K, C = Direct> {
    map: FastMap<K, (), C>,
}

impl<K> FastSet<K> {
    /// Creates an empty set with the [`Direct`] comparator.
    pub fn new() -> Self {
        Self::with_comparator(Direct::default())
    }

    /// Creates an empty set that holds `capacity` elements without resizing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: FastMap::with_capacity(capacity),
        }
    }
}

impl<K, C> FastSet<K, C> {
    /// Creates an empty set that hashes and compares elements with `comparator`.
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            map: FastMap::with_comparator(comparator),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the set holds no element.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The element comparator.
    pub fn comparator(&self) -> &C {
        self.map.comparator()
    }

    /// Iterates over the elements in insertion order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.map.iter(),
        }
    }

    /// Oldest element.
    pub fn first(&self) -> Option<&K> {
        self.map.first().map(|(key, _)| key)
    }

    /// Newest element.
    pub fn last(&self) -> Option<&K> {
        self.map.last().map(|(key, _)| key)
    }

    /// Removes all elements.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Makes entries retired in shared mode reusable again.
    pub fn reclaim(&mut self) -> usize {
        self.map.reclaim()
    }

    /// Occupancy figures of the underlying map.
    pub fn statistics(&self) -> MapStatistics {
        self.map.statistics()
    }
}

impl<K, C: Comparator<K>> FastSet<K, C> {
    /// Adds `value`. Returns `false` if an equal element was already present.
    pub fn insert(&mut self, value: K) -> Result<bool> {
        Ok(self.map.put_if_absent(value, ())?.is_none())
    }

    /// Returns `true` if an element equal to `value` is present.
    pub fn contains(&self, value: &K) -> bool {
        self.map.contains_key(value)
    }

    /// The stored element equal to `value`.
    pub fn get(&self, value: &K) -> Option<&K> {
        self.map.get_key_value(value).map(|(key, _)| key)
    }

    /// Removes the element equal to `value`. Returns `true` if there was one.
    pub fn remove(&mut self, value: &K) -> Result<bool> {
        Ok(self.map.remove(value)?.is_some())
    }
}

impl<K> Default for FastSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, C: Comparator<K> + Clone> Clone for FastSet<K, C> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<K: Debug, C> Debug for FastSet<K, C> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, C: Comparator<K>, D: Comparator<K>> PartialEq<FastSet<K, D>> for FastSet<K, C> {
    fn eq(&self, other: &FastSet<K, D>) -> bool {
        self.map == other.map
    }
}

impl<K, C: Comparator<K>> Eq for FastSet<K, C> {}

impl<K: Hash + Eq, S: BuildHasher> Extend<K> for FastSet<K, Direct<S>> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        self.map.extend(iter.into_iter().map(|key| (key, ())));
    }
}

impl<K: Hash + Eq, S: BuildHasher + Default> FromIterator<K> for FastSet<K, Direct<S>> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::with_comparator(Direct::default());
        set.extend(iter);
        set
    }
}

impl<K, C> Shareable for FastSet<K, C> {
    fn mark_shared(&mut self) {
        self.map.mark_shared();
    }

    fn is_shared(&self) -> bool {
        self.map.is_shared()
    }

    fn reclaim(&mut self) -> usize {
        self.map.reclaim()
    }
}

impl<K, C: Comparator<K>> Collection for FastSet<K, C> {
    type Item = K;
    type Iter<'a>
        = Iter<'a, K>
    where
        Self: 'a;

    fn len(&self) -> usize {
        self.map.len()
    }

    fn iter(&self) -> Iter<'_, K> {
        FastSet::iter(self)
    }

    fn contains(&self, value: &K) -> bool {
        FastSet::contains(self, value)
    }

    fn add(&mut self, value: K) -> Result<bool> {
        self.insert(value)
    }

    fn remove_item(&mut self, value: &K) -> Result<bool> {
        FastSet::remove(self, value)
    }

    fn clear(&mut self) -> Result<()> {
        FastSet::clear(self);
        Ok(())
    }
}

/// Iterator over the elements of a [`FastSet`], in insertion order.
pub struct Iter<'a, K> {
    inner: map::Iter<'a, K, ()>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> DoubleEndedIterator for Iter<'_, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<'a, K, C> IntoIterator for &'a FastSet<K, C> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Lexical;

    #[test]
    fn set_semantics_in_insertion_order() {
        let mut set = FastSet::new();
        assert!(set.insert(3).unwrap());
        assert!(set.insert(1).unwrap());
        assert!(!set.insert(3).unwrap());
        assert!(set.insert(2).unwrap());
        assert!(set.remove(&1).unwrap());
        assert!(!set.remove(&1).unwrap());
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(format!("{set:?}"), "{3, 2}");
        assert_eq!((set.first(), set.last()), (Some(&3), Some(&2)));
    }

    #[test]
    fn lexical_sets_compare_by_content() {
        let mut set = FastSet::with_comparator(Lexical);
        set.insert(String::from("x")).unwrap();
        assert!(set.contains(&String::from("x")));
        assert_eq!(set.get(&"x".to_string()).map(String::as_str), Some("x"));
        assert!(Collection::remove_item(&mut set, &"x".to_string()).unwrap());
        assert!(set.is_empty());
    }

    #[test]
    fn equality_and_collect() {
        let a: FastSet<u8> = [1, 2, 3].into_iter().collect();
        let b: FastSet<u8> = [3, 2, 1, 1].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(b.len(), 3);
    }
}
