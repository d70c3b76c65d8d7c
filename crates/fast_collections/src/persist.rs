//! Save/restore of collections as MessagePack.
//!
//! Every structure is written as a three element tuple: the descriptor of its comparator, the
//! element count, and the elements (key/value pairs for maps) in iteration order. Restoring
//! replays the elements through the normal insert path, so all structural invariants are
//! re-established from scratch rather than restored byte-for-byte.

use std::fmt::{self, Formatter};
use std::marker::PhantomData;

use serde::de::{DeserializeOwned, DeserializeSeed, Error as _, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::comparator::Comparator;
use crate::error::{Error, Result};
use crate::{FastMap, FastSequence, FastSet, FastTable};

/// Structures that can be rebuilt by replaying their saved elements.
pub trait Persistent: Sized {
    /// Unit of replay: an element, or a key/value pair for maps.
    type Element;

    /// Empty instance, with a default comparator, ready for replay.
    fn empty() -> Self;

    /// Descriptor of the comparator in use.
    fn descriptor(&self) -> &'static str;

    /// Re-inserts one saved element through the normal insert path.
    fn replay(&mut self, element: Self::Element) -> Result<()>;
}

/// Encodes `value` as MessagePack.
pub fn save<P: Serialize + ?Sized>(value: &P) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec(value)?)
}

/// Decodes a structure saved with [`save`].
///
/// Fails with [`Error::ComparatorMismatch`] if the data was saved with a different comparator
/// than the one `P` uses.
pub fn restore<P: Persistent + DeserializeOwned>(bytes: &[u8]) -> Result<P> {
    let (found, _, _): (String, u64, IgnoredAny) = rmp_serde::from_slice(bytes)?;
    let expected = P::empty().descriptor();
    if found != expected {
        return Err(Error::ComparatorMismatch { expected, found });
    }
    Ok(rmp_serde::from_slice(bytes)?)
}

/// Serializes a lazily produced element sequence.
struct Elements<F>(F);

impl<F, I> Serialize for Elements<F>
where
    F: Fn() -> I,
    I: IntoIterator,
    I::Item: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq((self.0)())
    }
}

fn serialize_persistent<S, F, I>(
    serializer: S,
    descriptor: &str,
    len: usize,
    elements: F,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    F: Fn() -> I,
    I: IntoIterator,
    I::Item: Serialize,
{
    let mut tuple = serializer.serialize_tuple(3)?;
    tuple.serialize_element(descriptor)?;
    tuple.serialize_element(&(len as u64))?;
    tuple.serialize_element(&Elements(elements))?;
    tuple.end()
}

/// Feeds a saved element sequence into [`Persistent::replay`], returning how many it replayed.
struct Replay<'a, P> {
    target: &'a mut P,
}

impl<'de, P> DeserializeSeed<'de> for Replay<'_, P>
where
    P: Persistent,
    P::Element: Deserialize<'de>,
{
    type Value = u64;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, P> Visitor<'de> for Replay<'_, P>
where
    P: Persistent,
    P::Element: Deserialize<'de>,
{
    type Value = u64;

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("a sequence of elements")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<u64, A::Error> {
        let mut replayed = 0;
        while let Some(element) = seq.next_element()? {
            self.target.replay(element).map_err(A::Error::custom)?;
            replayed += 1;
        }
        Ok(replayed)
    }
}

struct PersistentVisitor<P>(PhantomData<P>);

impl<'de, P> Visitor<'de> for PersistentVisitor<P>
where
    P: Persistent,
    P::Element: Deserialize<'de>,
{
    type Value = P;

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("a (descriptor, count, elements) tuple")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<P, A::Error> {
        let mut target = P::empty();
        let descriptor: String = seq
            .next_element()?
            .ok_or_else(|| A::Error::invalid_length(0, &self))?;
        if descriptor != target.descriptor() {
            return Err(A::Error::custom(format!(
                "comparator mismatch: expected {}, found {descriptor}",
                target.descriptor()
            )));
        }
        let count: u64 = seq
            .next_element()?
            .ok_or_else(|| A::Error::invalid_length(1, &self))?;
        let replayed = seq
            .next_element_seed(Replay {
                target: &mut target,
            })?
            .ok_or_else(|| A::Error::invalid_length(2, &self))?;
        if replayed != count {
            return Err(A::Error::custom(format!(
                "element count mismatch: header says {count}, found {replayed}"
            )));
        }
        Ok(target)
    }
}

fn deserialize_persistent<'de, D, P>(deserializer: D) -> std::result::Result<P, D::Error>
where
    D: Deserializer<'de>,
    P: Persistent,
    P::Element: Deserialize<'de>,
{
    deserializer.deserialize_tuple(3, PersistentVisitor(PhantomData))
}

impl<T, C: Comparator<T> + Default> Persistent for FastTable<T, C> {
    type Element = T;

    fn empty() -> Self {
        Self::with_comparator(C::default())
    }

    fn descriptor(&self) -> &'static str {
        self.comparator().descriptor()
    }

    fn replay(&mut self, element: T) -> Result<()> {
        self.push(element)
    }
}

impl<T: Serialize, C: Comparator<T>> Serialize for FastTable<T, C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let descriptor = self.comparator().descriptor();
        serialize_persistent(serializer, descriptor, self.len(), || self.iter())
    }
}

impl<'de, T, C> Deserialize<'de> for FastTable<T, C>
where
    T: Deserialize<'de>,
    C: Comparator<T> + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserialize_persistent(deserializer)
    }
}

impl<T, C: Comparator<T> + Default> Persistent for FastSequence<T, C> {
    type Element = T;

    fn empty() -> Self {
        Self::with_comparator(C::default())
    }

    fn descriptor(&self) -> &'static str {
        self.comparator().descriptor()
    }

    fn replay(&mut self, element: T) -> Result<()> {
        self.push_back(element).map(|_| ())
    }
}

impl<T: Serialize, C: Comparator<T>> Serialize for FastSequence<T, C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let descriptor = self.comparator().descriptor();
        serialize_persistent(serializer, descriptor, self.len(), || self.iter())
    }
}

impl<'de, T, C> Deserialize<'de> for FastSequence<T, C>
where
    T: Deserialize<'de>,
    C: Comparator<T> + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserialize_persistent(deserializer)
    }
}

impl<K, V, C, W> Persistent for FastMap<K, V, C, W>
where
    C: Comparator<K> + Default,
    W: Default,
{
    type Element = (K, V);

    fn empty() -> Self {
        FastMap::with_comparator(C::default()).with_value_comparator(W::default())
    }

    fn descriptor(&self) -> &'static str {
        self.comparator().descriptor()
    }

    fn replay(&mut self, (key, value): (K, V)) -> Result<()> {
        self.put(key, value).map(|_| ())
    }
}

impl<K: Serialize, V: Serialize, C: Comparator<K>, W> Serialize for FastMap<K, V, C, W> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let descriptor = self.comparator().descriptor();
        serialize_persistent(serializer, descriptor, self.len(), || self.iter())
    }
}

impl<'de, K, V, C, W> Deserialize<'de> for FastMap<K, V, C, W>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    C: Comparator<K> + Default,
    W: Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserialize_persistent(deserializer)
    }
}

impl<K, C: Comparator<K> + Default> Persistent for FastSet<K, C> {
    type Element = K;

    fn empty() -> Self {
        Self::with_comparator(C::default())
    }

    fn descriptor(&self) -> &'static str {
        self.comparator().descriptor()
    }

    fn replay(&mut self, element: K) -> Result<()> {
        self.insert(element).map(|_| ())
    }
}

impl<K: Serialize, C: Comparator<K>> Serialize for FastSet<K, C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let descriptor = self.comparator().descriptor();
        serialize_persistent(serializer, descriptor, self.len(), || self.iter())
    }
}

impl<'de, K, C> Deserialize<'de> for FastSet<K, C>
where
    K: Deserialize<'de>,
    C: Comparator<K> + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserialize_persistent(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::{Direct, Lexical, Rehash};

    #[test]
    fn map_round_trip_keeps_insertion_order() {
        let mut map: FastMap<String, u32> = FastMap::new();
        for i in 0..2000u32 {
            map.put(format!("key{}", (i * 7919) % 2000), i).unwrap();
        }
        for i in (0..2000).step_by(3) {
            map.remove(&format!("key{i}")).unwrap();
        }
        let bytes = save(&map).unwrap();
        let restored: FastMap<String, u32> = restore(&bytes).unwrap();
        assert_eq!(restored, map);
        assert!(restored.iter().eq(map.iter()));
    }

    #[test]
    fn lists_and_sets_round_trip() {
        let table: FastTable<i64> = (0..1500).map(|i| i * i - 700).collect();
        let restored: FastTable<i64> = restore(&save(&table).unwrap()).unwrap();
        assert_eq!(restored, table);

        let sequence: FastSequence<String> =
            ["x", "y", "z"].map(String::from).into_iter().collect();
        let restored: FastSequence<String> = restore(&save(&sequence).unwrap()).unwrap();
        assert_eq!(restored, sequence);

        let mut set = FastSet::with_comparator(Lexical);
        set.insert("b".to_string()).unwrap();
        set.insert("a".to_string()).unwrap();
        let restored: FastSet<String, Lexical> = restore(&save(&set).unwrap()).unwrap();
        assert_eq!(restored.iter().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn comparator_descriptor_is_checked() {
        let table: FastTable<u8> = [1, 2, 3].into_iter().collect();
        let bytes = save(&table).unwrap();
        let result: Result<FastTable<u8, Rehash>> = restore(&bytes);
        assert!(matches!(
            result,
            Err(Error::ComparatorMismatch { expected: "Rehash", ref found }) if found == "Direct"
        ));
        let direct: FastTable<u8, Direct> = restore(&bytes).unwrap();
        assert_eq!(direct.len(), 3);
    }

    #[test]
    fn count_mismatch_is_a_decode_error() {
        let bytes = rmp_serde::to_vec(&("Direct", 3u64, vec![1u8, 2])).unwrap();
        let result: Result<FastTable<u8>> = restore(&bytes);
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
