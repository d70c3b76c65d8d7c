//! Read-only views.

use std::fmt::{self, Debug, Formatter};

use crate::error::{Error, Result};
use crate::traits::{Collection, List, Map};

/// Read-only view over a collection or map.
///
/// Every read is delegated to the wrapped value; every mutator fails with
/// [`Error::Unsupported`] and leaves the wrapped value untouched.
pub struct Unmodifiable<'a, C> {
    inner: &'a C,
}

impl<'a, C> Unmodifiable<'a, C> {
    /// Wraps `inner`.
    pub fn new(inner: &'a C) -> Self {
        Self { inner }
    }

    /// The wrapped value.
    pub fn get_ref(&self) -> &'a C {
        self.inner
    }
}

impl<C> Clone for Unmodifiable<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Unmodifiable<'_, C> {}

impl<C: Debug> Debug for Unmodifiable<'_, C> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<C: Collection> Collection for Unmodifiable<'_, C> {
    type Item = C::Item;
    type Iter<'b>
        = C::Iter<'b>
    where
        Self: 'b;

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn iter(&self) -> C::Iter<'_> {
        self.inner.iter()
    }

    fn contains(&self, value: &C::Item) -> bool {
        self.inner.contains(value)
    }

    fn add(&mut self, _value: C::Item) -> Result<bool> {
        Err(Error::unsupported("add"))
    }

    fn remove_item(&mut self, _value: &C::Item) -> Result<bool> {
        Err(Error::unsupported("remove_item"))
    }

    fn clear(&mut self) -> Result<()> {
        Err(Error::unsupported("clear"))
    }
}

impl<C: List> List for Unmodifiable<'_, C> {
    type Snapshot = C::Snapshot;

    fn get(&self, index: usize) -> Result<&C::Item> {
        self.inner.get(index)
    }

    fn set(&mut self, _index: usize, _value: C::Item) -> Result<C::Item> {
        Err(Error::unsupported("set"))
    }

    fn insert(&mut self, _index: usize, _value: C::Item) -> Result<()> {
        Err(Error::unsupported("insert"))
    }

    fn remove(&mut self, _index: usize) -> Result<C::Item> {
        Err(Error::unsupported("remove"))
    }

    fn index_of(&self, value: &C::Item) -> Option<usize> {
        self.inner.index_of(value)
    }

    fn last_index_of(&self, value: &C::Item) -> Option<usize> {
        self.inner.last_index_of(value)
    }

    fn index_of_range(&self, value: &C::Item, from: usize, to: usize) -> Option<usize> {
        self.inner.index_of_range(value, from, to)
    }

    fn snapshot(&self) -> C::Snapshot {
        self.inner.snapshot()
    }
}

impl<M: Map> Map for Unmodifiable<'_, M> {
    type Key = M::Key;
    type Value = M::Value;
    type Iter<'b>
        = M::Iter<'b>
    where
        Self: 'b;

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, key: &M::Key) -> Option<&M::Value> {
        self.inner.get(key)
    }

    fn contains_key(&self, key: &M::Key) -> bool {
        self.inner.contains_key(key)
    }

    fn put(&mut self, _key: M::Key, _value: M::Value) -> Result<Option<M::Value>> {
        Err(Error::unsupported("put"))
    }

    fn put_if_absent(&mut self, _key: M::Key, _value: M::Value) -> Result<Option<&M::Value>> {
        Err(Error::unsupported("put_if_absent"))
    }

    fn remove(&mut self, _key: &M::Key) -> Result<Option<M::Value>> {
        Err(Error::unsupported("remove"))
    }

    fn clear(&mut self) -> Result<()> {
        Err(Error::unsupported("clear"))
    }

    fn iter(&self) -> M::Iter<'_> {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FastMap, FastSequence, FastTable};

    #[test]
    fn lists_reject_mutation() {
        let table: FastTable<u32> = (0..5).collect();
        let mut view = Unmodifiable::new(&table);
        assert_eq!(List::get(&view, 3).unwrap(), &3);
        assert_eq!(view.index_of_range(&3, 2, 5), Some(1));
        assert!(matches!(
            view.add(9),
            Err(Error::Unsupported { operation: "add" })
        ));
        assert!(view.set(0, 9).is_err());
        assert!(List::insert(&mut view, 0, 9).is_err());
        assert!(List::remove(&mut view, 0).is_err());
        assert!(Collection::clear(&mut view).is_err());
        assert_eq!(Collection::iter(&view).count(), 5);
        assert_eq!(table.len(), 5);

        let sequence: FastSequence<&str> = ["a", "b"].into_iter().collect();
        let mut view = Unmodifiable::new(&sequence);
        assert!(view.contains(&"b"));
        assert!(view.remove_item(&"b").is_err());
        assert_eq!(format!("{view:?}"), r#"["a", "b"]"#);
    }

    #[test]
    fn maps_reject_mutation() {
        let mut map = FastMap::new();
        map.put("k", 1).unwrap();
        let mut view = Unmodifiable::new(&map);
        assert_eq!(Map::get(&view, &"k"), Some(&1));
        assert!(Map::contains_key(&view, &"k"));
        assert!(Map::put(&mut view, "j", 2).is_err());
        assert!(Map::put_if_absent(&mut view, "j", 2).is_err());
        assert!(Map::remove(&mut view, &"k").is_err());
        assert!(Map::clear(&mut view).is_err());
        assert_eq!(Map::iter(&view).collect::<Vec<_>>(), vec![(&"k", &1)]);
        assert_eq!(map.len(), 1);
    }
}
