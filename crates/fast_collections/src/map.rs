//! Insertion-ordered hash map over a tree of open-addressing tables.
//!
//! Entries live in a [`NodePool`] and form one doubly-linked chain in insertion order, bracketed
//! by a head and a tail sentinel. The hash tables only store entry indices, so iteration order is
//! independent of how the tables are shaped. Callers can walk the chain with [`EntryRef`]s,
//! starting from [`FastMap::head`] or [`FastMap::tail`].
//!
//! Tables form a tree. A table is either a flat array of slots probed linearly, or a node whose
//! 64 children take over its entries. A table at depth `d` routes on hash bits `6d..6d+6` and
//! starts probing at `hash >> 6d`, so a key keeps landing in the same child however often its
//! ancestors resize. All tables are kept in one `Vec` and refer to their children by position.
//!
//! Resizing a flat table happens once it is more than half full (live entries plus tombstones):
//! -   With more tombstones than entries, the table is rebuilt at the same size.
//! -   Otherwise, while the doubled table stays within [`C1`] slots, it is doubled.
//! -   Otherwise it splits into [`C2`] children. If one child fills up during the split, the hash
//!     codes are too clustered to benefit, and the table is doubled flat instead.
//!
//! Invariants:
//! -   `entry_count + tombstone_count <= slots.len() / 2` for every flat table after each put.
//! -   A table with children has no slots of its own.
//! -   Following `next` from `head` visits exactly `len` entries before reaching `tail`.

use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{BuildHasher, Hash};
use std::mem;

use crate::comparator::{Comparator, Direct};
use crate::config::{PoolConfig, B2, C0, C1, C2};
use crate::error::{Error, Result};
use crate::pool::{Handle, NodePool};
use crate::traits::{Map, Shareable};

/// Slot that never held an entry. Ends every probe.
const EMPTY: u32 = u32::MAX;
/// Slot whose entry was removed. Probes continue past it.
const TOMBSTONE: u32 = u32::MAX - 1;

struct Entry<K, V> {
    /// `None` only for the two sentinels.
    pair: Option<(K, V)>,
    hash: u32,
    prev: u32,
    next: u32,
}

struct Table {
    slots: Vec<u32>,
    entry_count: usize,
    tombstone_count: usize,
    /// Position of the first of the [`C2`] consecutive children in `FastMap::tables`.
    children: Option<usize>,
    key_shift: u32,
}

#[inline]
fn shifted(hash: u32, shift: u32) -> usize {
    hash.checked_shr(shift).unwrap_or(0) as usize
}

#[inline]
fn is_live(slot: u32) -> bool {
    slot != EMPTY && slot != TOMBSTONE
}

impl Table {
    fn new(len: usize, key_shift: u32) -> Self {
        Self {
            slots: vec![EMPTY; len],
            entry_count: 0,
            tombstone_count: 0,
            children: None,
            key_shift,
        }
    }

    /// Stores `index` in the first empty slot of its probe sequence.
    fn place(&mut self, index: u32, hash: u32) {
        let mask = self.slots.len() - 1;
        let mut slot = shifted(hash, self.key_shift) & mask;
        while self.slots[slot] != EMPTY {
            slot = (slot + 1) & mask;
        }
        self.slots[slot] = index;
        self.entry_count += 1;
    }

    fn is_crowded(&self) -> bool {
        self.entry_count + self.tombstone_count > self.slots.len() >> 1
    }
}

enum Probe {
    /// The key is stored in `slot` by the entry at pool index `entry`.
    Found { entry: u32, slot: usize },
    /// The key is absent. `slot` is where it would be inserted.
    Vacant { slot: usize },
}

/// Occupancy figures of a [`FastMap`], useful to spot badly distributed hash codes.
///
/// The average distance should stay well below 20% (most entries sit in their home slot or
/// close to it).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MapStatistics {
    /// Number of mappings.
    pub len: usize,
    /// Number of pooled entry records, live or free.
    pub entries: usize,
    /// Total number of slots over all flat tables.
    pub slots: usize,
    /// Whether the root table has split into sub-tables.
    pub uses_sub_tables: bool,
    /// Depth of the deepest sub-table.
    pub depth: usize,
    /// Number of tombstone slots.
    pub tombstones: usize,
    /// Whether the map is in shared mode.
    pub shared: bool,
    /// Average distance of an entry from its home slot, in percent.
    pub average_distance_percent: usize,
    /// Largest distance of an entry from its home slot.
    pub max_distance: usize,
}

impl Display for MapStatistics {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "size: {}, entries: {}, slots: {}, sub-tables: {}, depth: {}, tombstones: {}, \
             shared: {}, average distance: {}%, max distance: {}",
            self.len,
            self.entries,
            self.slots,
            self.uses_sub_tables,
            self.depth,
            self.tombstones,
            self.shared,
            self.average_distance_percent,
            self.max_distance
        )
    }
}

/// Stable reference to an entry of a [`FastMap`].
///
/// An `EntryRef` stays valid until its mapping is removed. After that, every operation taking it
/// reports [`Error::NoSuchElement`] (or returns `None`), even if the pool slot was reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EntryRef(Handle);

impl EntryRef {
    /// The pool handle behind this reference.
    pub fn handle(&self) -> Handle {
        self.0
    }
}

/// Hash map that iterates in insertion order and never rehashes more than [`C1`] slots at once.
///
/// Keys are hashed and compared with `C`. Values are compared with `W`, which only matters for
/// [`FastMap::contains_value`] and map equality.
pub struct FastMap<K, V, C = Direct, W = Direct> {
    pool: NodePool<Entry<K, V>>,
    head: u32,
    tail: u32,
    tables: Vec<Table>,
    root_slots: usize,
    len: usize,
    shared: bool,
    comparator: C,
    value_comparator: W,
}

impl<K, V> FastMap<K, V> {
    /// Creates an empty map with the [`Direct`] key comparator.
    pub fn new() -> Self {
        Self::with_comparator(Direct::default())
    }

    /// Creates an empty map that holds `capacity` mappings without resizing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, Direct::default())
    }
}

impl<K, V, C> FastMap<K, V, C> {
    /// Creates an empty map that hashes and compares keys with `comparator`.
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_capacity_and_comparator(4, comparator)
    }

    /// Creates an empty map with `capacity` pre-pooled entries and a root table of at least twice
    /// that many slots.
    pub fn with_capacity_and_comparator(capacity: usize, comparator: C) -> Self {
        Self::with_parts(capacity, comparator, Direct::default())
    }
}

impl<K, V, C, W> FastMap<K, V, C, W> {
    fn with_parts(capacity: usize, comparator: C, value_comparator: W) -> Self {
        let mut table_len = C0;
        while table_len < capacity {
            table_len <<= 1;
        }
        let root_slots = table_len << 1;
        let mut pool = NodePool::new(PoolConfig::map().with_initial(capacity + 2));
        let sentinel = || Entry {
            pair: None,
            hash: 0,
            prev: 0,
            next: 0,
        };
        let head = pool.allocate(sentinel()).index();
        let tail = pool.allocate(sentinel()).index();
        pool.at_mut(head).next = tail;
        pool.at_mut(tail).prev = head;
        Self {
            pool,
            head,
            tail,
            tables: vec![Table::new(root_slots, 0)],
            root_slots,
            len: 0,
            shared: false,
            comparator,
            value_comparator,
        }
    }

    /// Switches to `value_comparator` for comparing values. The mappings are kept as they are.
    pub fn with_value_comparator<X>(self, value_comparator: X) -> FastMap<K, V, C, X> {
        FastMap {
            pool: self.pool,
            head: self.head,
            tail: self.tail,
            tables: self.tables,
            root_slots: self.root_slots,
            len: self.len,
            shared: self.shared,
            comparator: self.comparator,
            value_comparator,
        }
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map holds no mapping.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The key comparator.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// The value comparator.
    pub fn value_comparator(&self) -> &W {
        &self.value_comparator
    }

    /// The head sentinel. Its successor is the oldest entry.
    pub fn head(&self) -> EntryRef {
        self.entry_ref(self.head)
    }

    /// The tail sentinel. Its predecessor is the newest entry.
    pub fn tail(&self) -> EntryRef {
        self.entry_ref(self.tail)
    }

    fn entry_ref(&self, index: u32) -> EntryRef {
        EntryRef(self.pool.handle_at(index))
    }

    /// Entry following `entry`, or `None` at the end of the chain or if `entry` was removed.
    pub fn next(&self, entry: EntryRef) -> Option<EntryRef> {
        let next = self.pool.get(entry.0)?.next;
        (entry.0.index() != self.tail && next != self.tail).then(|| self.entry_ref(next))
    }

    /// Entry preceding `entry`, or `None` at the start of the chain or if `entry` was removed.
    pub fn previous(&self, entry: EntryRef) -> Option<EntryRef> {
        let prev = self.pool.get(entry.0)?.prev;
        (entry.0.index() != self.head && prev != self.head).then(|| self.entry_ref(prev))
    }

    /// Key and value of `entry`. `None` for sentinels and removed entries.
    pub fn entry(&self, entry: EntryRef) -> Option<(&K, &V)> {
        self.pool
            .get(entry.0)?
            .pair
            .as_ref()
            .map(|(key, value)| (key, value))
    }

    /// Replaces the value of `entry` in place, returning the previous value.
    pub fn set_value(&mut self, entry: EntryRef, value: V) -> Result<V> {
        let (_, stored) = self
            .pool
            .get_mut(entry.0)
            .and_then(|stored| stored.pair.as_mut())
            .ok_or(Error::NoSuchElement)?;
        Ok(mem::replace(stored, value))
    }

    fn pair_at(&self, index: u32) -> (&K, &V) {
        match &self.pool.at(index).pair {
            Some((key, value)) => (key, value),
            None => panic!("sentinel {index} inside the entry chain"),
        }
    }

    /// Position of the flat table responsible for `hash`.
    fn table_for(&self, hash: u32) -> usize {
        let mut position = 0;
        while let Some(first_child) = self.tables[position].children {
            let table = &self.tables[position];
            position = first_child + (shifted(hash, table.key_shift) & (C2 - 1));
        }
        position
    }

    /// Iterates over the mappings in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            pool: &self.pool,
            front: self.pool.at(self.head).next,
            back: self.pool.at(self.tail).prev,
            remaining: self.len,
        }
    }

    /// Iterates over the keys in insertion order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator {
        self.iter().map(|(key, _)| key)
    }

    /// Iterates over the values in insertion order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.iter().map(|(_, value)| value)
    }

    /// Iterates mutably over the values in insertion order.
    ///
    /// Collects the references up front, which costs one walk of the chain and a sort of the
    /// entry indices.
    pub fn values_mut(&mut self) -> std::vec::IntoIter<&mut V> {
        let mut ranked = Vec::with_capacity(self.len);
        let mut index = self.pool.at(self.head).next;
        while index != self.tail {
            ranked.push((index, ranked.len()));
            index = self.pool.at(index).next;
        }
        ranked.sort_unstable();
        let indices: Vec<u32> = ranked.iter().map(|&(index, _)| index).collect();
        let mut values: Vec<Option<&mut V>> = (0..ranked.len()).map(|_| None).collect();
        for (&(_, rank), entry) in ranked.iter().zip(self.pool.at_many_mut(&indices)) {
            values[rank] = entry.pair.as_mut().map(|(_, value)| value);
        }
        values.into_iter().flatten().collect::<Vec<_>>().into_iter()
    }

    /// Oldest mapping.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.iter().next()
    }

    /// Newest mapping.
    pub fn last(&self) -> Option<(&K, &V)> {
        self.iter().next_back()
    }

    /// Returns `true` if some key maps to a value equal to `value` per the value comparator.
    pub fn contains_value(&self, value: &V) -> bool
    where
        W: Comparator<V>,
    {
        self.values().any(|v| self.value_comparator.are_equal(v, value))
    }

    /// Map from each value back to its key, keyed with the value comparator. When several keys
    /// share a value, the newest key wins at the position of the oldest.
    pub fn reverse(&self) -> Result<FastMap<V, K, W, C>>
    where
        K: Clone,
        V: Clone,
        C: Clone,
        W: Comparator<V> + Clone,
    {
        let mut reversed: FastMap<V, K, W, C> =
            FastMap::with_parts(self.len, self.value_comparator.clone(), self.comparator.clone());
        for (key, value) in self.iter() {
            reversed.put(value.clone(), key.clone())?;
        }
        Ok(reversed)
    }

    /// Removes all mappings.
    ///
    /// In shared mode the entries are retired rather than recycled, so readers holding on to the
    /// old chain are unaffected.
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
        self.tables = vec![Table::new(self.root_slots, 0)];
        self.len = 0;
    }

    /// Makes entries retired in shared mode reusable again. Returns how many were reclaimed.
    pub fn reclaim(&mut self) -> usize {
        self.pool.reclaim_retired()
    }

    /// Current occupancy figures.
    pub fn statistics(&self) -> MapStatistics {
        let mut stats = MapStatistics {
            len: self.len,
            entries: self.pool.capacity() - 2,
            slots: 0,
            uses_sub_tables: self.tables[0].children.is_some(),
            depth: 0,
            tombstones: 0,
            shared: self.shared,
            average_distance_percent: 0,
            max_distance: 0,
        };
        let mut distance_sum = 0;
        let mut pending = vec![(0, 0)];
        while let Some((position, depth)) = pending.pop() {
            let table = &self.tables[position];
            if let Some(first_child) = table.children {
                pending.extend((first_child..first_child + C2).map(|child| (child, depth + 1)));
                continue;
            }
            stats.depth = stats.depth.max(depth);
            stats.slots += table.slots.len();
            stats.tombstones += table.tombstone_count;
            let mask = table.slots.len() - 1;
            for (slot, &index) in table.slots.iter().enumerate() {
                if !is_live(index) {
                    continue;
                }
                let home = shifted(self.pool.at(index).hash, table.key_shift) & mask;
                let distance = (slot + table.slots.len() - home) & mask;
                distance_sum += distance;
                stats.max_distance = stats.max_distance.max(distance);
            }
        }
        if self.len > 0 {
            stats.average_distance_percent = 100 * distance_sum / self.len;
        }
        stats
    }

    fn resize(&mut self, position: usize) {
        let table = &mut self.tables[position];
        let len = table.slots.len();
        let key_shift = table.key_shift;
        let tombstones = mem::take(&mut table.tombstone_count);
        if tombstones > table.entry_count {
            let old = mem::take(&mut table.slots);
            self.rebuild(position, &old, len);
            return;
        }
        let new_len = len << 1;
        if new_len <= C1 {
            let old = mem::take(&mut table.slots);
            self.rebuild(position, &old, new_len);
            return;
        }

        let old = mem::take(&mut table.slots);
        let first_child = self.tables.len();
        let child_len = new_len >> (B2 - 1);
        self.tables
            .extend((0..C2).map(|_| Table::new(child_len, key_shift + B2)));
        for &index in old.iter().filter(|&&index| is_live(index)) {
            let hash = self.pool.at(index).hash;
            let child = &mut self.tables[first_child + (shifted(hash, key_shift) & (C2 - 1))];
            child.place(index, hash);
            if (child.entry_count + child.tombstone_count) << 1 >= child.slots.len() {
                log::warn!(
                    "unevenly distributed hash codes, degraded performance: growing a flat \
                     table to {new_len} slots instead of splitting it"
                );
                self.tables.truncate(first_child);
                self.rebuild(position, &old, new_len);
                return;
            }
        }
        let table = &mut self.tables[position];
        table.entry_count = 0;
        table.children = Some(first_child);
        log::debug!(
            "split a table of {len} slots into {C2} sub-tables of {child_len} slots (key shift {})",
            key_shift + B2
        );
    }

    /// Replaces the slots of a flat table with `len` fresh slots holding the live entries of `old`.
    fn rebuild(&mut self, position: usize, old: &[u32], len: usize) {
        let mut table = Table::new(len, self.tables[position].key_shift);
        for &index in old.iter().filter(|&&index| is_live(index)) {
            table.place(index, self.pool.at(index).hash);
        }
        self.tables[position] = table;
    }

    /// Links a new entry at the end of the chain and stores it in `slot` of the flat table at
    /// `position`. Returns the pool index of the entry.
    fn insert_new(&mut self, position: usize, slot: usize, hash: u32, key: K, value: V) -> u32 {
        let prev = self.pool.at(self.tail).prev;
        let index = self
            .pool
            .allocate(Entry {
                pair: Some((key, value)),
                hash,
                prev,
                next: self.tail,
            })
            .index();
        self.pool.at_mut(prev).next = index;
        self.pool.at_mut(self.tail).prev = index;
        self.len += 1;

        let table = &mut self.tables[position];
        if table.slots[slot] == TOMBSTONE {
            table.tombstone_count -= 1;
        }
        table.slots[slot] = index;
        table.entry_count += 1;
        if table.is_crowded() {
            self.resize(position);
        }
        index
    }
}

impl<K, V, C: Comparator<K>, W> FastMap<K, V, C, W> {
    fn probe(&self, position: usize, key: &K, hash: u32) -> Probe {
        let table = &self.tables[position];
        let mask = table.slots.len() - 1;
        let start = shifted(hash, table.key_shift);
        let mut vacant = None;
        for step in 0..table.slots.len() {
            let slot = start.wrapping_add(step) & mask;
            match table.slots[slot] {
                EMPTY => {
                    return Probe::Vacant {
                        slot: vacant.unwrap_or(slot),
                    }
                }
                TOMBSTONE => {
                    vacant.get_or_insert(slot);
                }
                entry => {
                    let stored = self.pool.at(entry);
                    if stored.hash == hash
                        && stored
                            .pair
                            .as_ref()
                            .is_some_and(|(k, _)| self.comparator.are_equal(key, k))
                    {
                        return Probe::Found { entry, slot };
                    }
                }
            }
        }
        match vacant {
            Some(slot) => Probe::Vacant { slot },
            None => unreachable!("flat table without a free slot"),
        }
    }

    fn find(&self, key: &K) -> Option<u32> {
        if !self.comparator.admits(key) {
            return None;
        }
        let hash = self.comparator.hash_of(key);
        match self.probe(self.table_for(hash), key, hash) {
            Probe::Found { entry, .. } => Some(entry),
            Probe::Vacant { .. } => None,
        }
    }

    /// Value associated with `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|index| self.pair_at(index).1)
    }

    /// Mutable value associated with `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = self.find(key)?;
        self.pool
            .at_mut(index)
            .pair
            .as_mut()
            .map(|(_, value)| value)
    }

    /// Entry holding `key`.
    pub fn get_entry(&self, key: &K) -> Option<EntryRef> {
        self.find(key).map(|index| self.entry_ref(index))
    }

    /// Key/value pair stored for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.find(key).map(|index| self.pair_at(index))
    }

    /// Returns `true` if `key` is mapped.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    fn admit(&self, key: &K) -> Result<()> {
        if self.comparator.admits(key) {
            Ok(())
        } else {
            Err(Error::NullKey)
        }
    }

    /// Returns the pool index of the entry holding `key` and the value it replaced.
    fn put_admitted(&mut self, key: K, value: V) -> (u32, Option<V>) {
        let hash = self.comparator.hash_of(&key);
        let position = self.table_for(hash);
        match self.probe(position, &key, hash) {
            Probe::Found { entry, .. } => {
                let previous = self
                    .pool
                    .at_mut(entry)
                    .pair
                    .as_mut()
                    .map(|(_, stored)| mem::replace(stored, value));
                (entry, previous)
            }
            Probe::Vacant { slot } => (self.insert_new(position, slot, hash, key, value), None),
        }
    }

    /// Associates `value` with `key`, returning the previous value. An existing key keeps its
    /// position in the iteration order.
    pub fn put(&mut self, key: K, value: V) -> Result<Option<V>> {
        self.admit(&key)?;
        Ok(self.put_admitted(key, value).1)
    }

    /// Same as [`FastMap::put`], but returns the entry holding `key`.
    pub fn put_entry(&mut self, key: K, value: V) -> Result<EntryRef> {
        self.admit(&key)?;
        let (index, _) = self.put_admitted(key, value);
        Ok(self.entry_ref(index))
    }

    /// Associates `value` with `key` unless `key` is already mapped, in which case the existing
    /// value is returned and nothing changes.
    pub fn put_if_absent(&mut self, key: K, value: V) -> Result<Option<&V>> {
        self.admit(&key)?;
        let hash = self.comparator.hash_of(&key);
        let position = self.table_for(hash);
        match self.probe(position, &key, hash) {
            Probe::Found { entry, .. } => Ok(Some(self.pair_at(entry).1)),
            Probe::Vacant { slot } => {
                self.insert_new(position, slot, hash, key, value);
                Ok(None)
            }
        }
    }

    /// Removes the mapping for `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Result<Option<V>> {
        self.admit(key)?;
        let hash = self.comparator.hash_of(key);
        let position = self.table_for(hash);
        let (entry, slot) = match self.probe(position, key, hash) {
            Probe::Found { entry, slot } => (entry, slot),
            Probe::Vacant { .. } => return Ok(None),
        };
        let table = &mut self.tables[position];
        table.slots[slot] = TOMBSTONE;
        table.tombstone_count += 1;
        table.entry_count -= 1;

        let (prev, next) = {
            let stored = self.pool.at(entry);
            (stored.prev, stored.next)
        };
        self.pool.at_mut(prev).next = next;
        self.pool.at_mut(next).prev = prev;
        self.len -= 1;
        let handle = self.pool.handle_at(entry);
        let removed = if self.shared {
            self.pool.retire(handle)
        } else {
            self.pool.release(handle)
        };
        Ok(removed.and_then(|entry| entry.pair).map(|(_, value)| value))
    }
}

impl<K, V> Default for FastMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C, W> Clone for FastMap<K, V, C, W>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
    W: Clone,
{
    fn clone(&self) -> Self {
        let mut clone = Self::with_parts(
            self.len,
            self.comparator.clone(),
            self.value_comparator.clone(),
        );
        for (key, value) in self.iter() {
            clone.put_admitted(key.clone(), value.clone());
        }
        clone.shared = self.shared;
        clone
    }
}

impl<K: Debug, V: Debug, C, W> Debug for FastMap<K, V, C, W> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Two maps are equal if they hold the same mappings, regardless of order. Values are compared
/// with the value comparator of the left-hand map.
impl<K, V, C, D, W, X> PartialEq<FastMap<K, V, D, X>> for FastMap<K, V, C, W>
where
    C: Comparator<K>,
    D: Comparator<K>,
    W: Comparator<V>,
{
    fn eq(&self, other: &FastMap<K, V, D, X>) -> bool {
        self.len == other.len
            && self.iter().all(|(key, value)| {
                other
                    .get(key)
                    .is_some_and(|v| self.value_comparator.are_equal(value, v))
            })
    }
}

impl<K, V, C: Comparator<K>, W: Comparator<V>> Eq for FastMap<K, V, C, W> {}

impl<K, V, S> Extend<(K, V)> for FastMap<K, V, Direct<S>>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put_admitted(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for FastMap<K, V, Direct<S>>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_comparator(Direct::default());
        map.extend(iter);
        map
    }
}

impl<K, V, C, W> Shareable for FastMap<K, V, C, W> {
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

impl<K, V, C: Comparator<K>, W> Map for FastMap<K, V, C, W> {
    type Key = K;
    type Value = V;
    type Iter<'a>
        = Iter<'a, K, V>
    where
        Self: 'a;

    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, key: &K) -> Option<&V> {
        FastMap::get(self, key)
    }

    fn contains_key(&self, key: &K) -> bool {
        FastMap::contains_key(self, key)
    }

    fn put(&mut self, key: K, value: V) -> Result<Option<V>> {
        FastMap::put(self, key, value)
    }

    fn put_if_absent(&mut self, key: K, value: V) -> Result<Option<&V>> {
        FastMap::put_if_absent(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Result<Option<V>> {
        FastMap::remove(self, key)
    }

    fn clear(&mut self) -> Result<()> {
        FastMap::clear(self);
        Ok(())
    }

    fn iter(&self) -> Iter<'_, K, V> {
        FastMap::iter(self)
    }
}

/// Iterator over the mappings of a [`FastMap`], in insertion order.
pub struct Iter<'a, K, V> {
    pool: &'a NodePool<Entry<K, V>>,
    front: u32,
    back: u32,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.pool.at(self.front);
        self.front = entry.next;
        self.remaining -= 1;
        entry.pair.as_ref().map(|(key, value)| (key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.pool.at(self.back);
        self.back = entry.prev;
        self.remaining -= 1;
        entry.pair.as_ref().map(|(key, value)| (key, value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V, C, W> IntoIterator for &'a FastMap<K, V, C, W> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}
