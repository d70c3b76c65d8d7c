//! Equality, hashing and ordering strategies.
//!
//! Every collection takes its comparator as a value at construction time. The comparator decides
//! how elements (or keys) are hashed, when two of them are equal, and whether a value is admitted
//! at all. The choice never affects correctness, only distribution quality, with the exception of
//! [`NonNull`] which rejects `None`.

use std::cmp::Ordering;
use std::hash::{BuildHasher, Hash};

use fnv::FnvBuildHasher;

/// Hashing and equality capability consumed by the collections.
pub trait Comparator<T: ?Sized> {
    /// 32-bit hash code of `value`. Equal values must have equal hash codes.
    fn hash_of(&self, value: &T) -> u32;

    /// Whether `left` and `right` are considered the same element.
    fn are_equal(&self, left: &T, right: &T) -> bool;

    /// Whether `value` may be stored at all. Collections report [`Error::NullKey`] or
    /// [`Error::NullValue`] for values that are not admitted.
    ///
    /// [`Error::NullKey`]: crate::Error::NullKey
    /// [`Error::NullValue`]: crate::Error::NullValue
    fn admits(&self, _value: &T) -> bool {
        true
    }

    /// Short name stored alongside saved collections.
    fn descriptor(&self) -> &'static str;
}

/// Comparators that can also order elements (used for sorting).
pub trait OrderComparator<T: ?Sized>: Comparator<T> {
    /// Total order consistent with [`Comparator::are_equal`].
    fn compare(&self, left: &T, right: &T) -> Ordering;
}

/// Folds a 64-bit hash into the 32 bits the tables route on.
#[inline]
fn fold(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32
}

/// Uses the key's own `Hash` implementation, unmodified apart from folding to 32 bits.
///
/// Best choice when hash codes are known to be well distributed (the default FNV hasher is).
#[derive(Debug, Clone, Default)]
pub struct Direct<S = FnvBuildHasher> {
    build_hasher: S,
}

impl<S> Direct<S> {
    /// Creates a direct comparator hashing through `build_hasher`.
    pub fn with_hasher(build_hasher: S) -> Self {
        Self { build_hasher }
    }
}

impl<T, S> Comparator<T> for Direct<S>
where
    T: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn hash_of(&self, value: &T) -> u32 {
        fold(self.build_hasher.hash_one(value))
    }

    #[inline]
    fn are_equal(&self, left: &T, right: &T) -> bool {
        left == right
    }

    fn descriptor(&self) -> &'static str {
        "Direct"
    }
}

impl<T, S> OrderComparator<T> for Direct<S>
where
    T: Hash + Ord + ?Sized,
    S: BuildHasher,
{
    fn compare(&self, left: &T, right: &T) -> Ordering {
        left.cmp(right)
    }
}

/// Redistributes poorly spread hash codes through a fixed bit-mixing formula.
///
/// Useful when the key's own hash clusters (for example keys whose hash is a small counter or a
/// multiple of a power of two).
#[derive(Debug, Clone, Default)]
pub struct Rehash<S = FnvBuildHasher> {
    direct: Direct<S>,
}

impl<S> Rehash<S> {
    /// Creates a rehashing comparator on top of `build_hasher`.
    pub fn with_hasher(build_hasher: S) -> Self {
        Self {
            direct: Direct::with_hasher(build_hasher),
        }
    }

    /// The mixing step applied to every hash code.
    #[inline]
    pub fn mix(hash: u32) -> u32 {
        let mut h = hash;
        h = h.wrapping_add(!(h << 9));
        h ^= h >> 14;
        h = h.wrapping_add(h << 4);
        h ^ (h >> 10)
    }
}

impl<T, S> Comparator<T> for Rehash<S>
where
    T: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn hash_of(&self, value: &T) -> u32 {
        Self::mix(self.direct.hash_of(value))
    }

    #[inline]
    fn are_equal(&self, left: &T, right: &T) -> bool {
        left == right
    }

    fn descriptor(&self) -> &'static str {
        "Rehash"
    }
}

impl<T, S> OrderComparator<T> for Rehash<S>
where
    T: Hash + Ord + ?Sized,
    S: BuildHasher,
{
    fn compare(&self, left: &T, right: &T) -> Ordering {
        left.cmp(right)
    }
}

/// Compares string-like values by content.
///
/// The hash is computed over UTF-16 code units (`31 * h + unit`), so any two representations of
/// the same text hash identically.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lexical;

impl<T> Comparator<T> for Lexical
where
    T: AsRef<str> + ?Sized,
{
    fn hash_of(&self, value: &T) -> u32 {
        value
            .as_ref()
            .encode_utf16()
            .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as u32))
    }

    fn are_equal(&self, left: &T, right: &T) -> bool {
        left.as_ref() == right.as_ref()
    }

    fn descriptor(&self) -> &'static str {
        "Lexical"
    }
}

impl<T> OrderComparator<T> for Lexical
where
    T: AsRef<str> + ?Sized,
{
    fn compare(&self, left: &T, right: &T) -> Ordering {
        left.as_ref().cmp(right.as_ref())
    }
}

/// Wraps a comparator for `Option<T>` elements and refuses to store `None`.
#[derive(Debug, Clone, Default)]
pub struct NonNull<C> {
    inner: C,
}

impl<C> NonNull<C> {
    /// Rejects `None` and delegates everything else to `inner`.
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<T, C> Comparator<Option<T>> for NonNull<C>
where
    C: Comparator<T>,
{
    fn hash_of(&self, value: &Option<T>) -> u32 {
        value.as_ref().map_or(0, |v| self.inner.hash_of(v))
    }

    fn are_equal(&self, left: &Option<T>, right: &Option<T>) -> bool {
        match (left, right) {
            (Some(l), Some(r)) => self.inner.are_equal(l, r),
            (None, None) => true,
            _ => false,
        }
    }

    fn admits(&self, value: &Option<T>) -> bool {
        value.is_some()
    }

    fn descriptor(&self) -> &'static str {
        "NonNull"
    }
}

impl<T, C> OrderComparator<Option<T>> for NonNull<C>
where
    C: OrderComparator<T>,
{
    fn compare(&self, left: &Option<T>, right: &Option<T>) -> Ordering {
        match (left, right) {
            (Some(l), Some(r)) => self.inner.compare(l, r),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_and_rehash_agree_on_equality() {
        let direct = Direct::<FnvBuildHasher>::default();
        let rehash = Rehash::<FnvBuildHasher>::default();
        assert_eq!(direct.hash_of(&42u32), direct.hash_of(&42u32));
        assert_eq!(rehash.hash_of("abc"), rehash.hash_of("abc"));
        assert_eq!(
            rehash.hash_of(&7u64),
            Rehash::<FnvBuildHasher>::mix(direct.hash_of(&7u64))
        );
        assert!(Comparator::<str>::are_equal(&rehash, "x", "x"));
    }

    #[test]
    fn rehash_spreads_clustered_hashes() {
        // Multiples of 1024 share their low ten bits; after mixing they should not.
        let low_bits: std::collections::HashSet<u32> = (0..64u32)
            .map(|i| Rehash::<FnvBuildHasher>::mix(i << 10) & 63)
            .collect();
        assert!(low_bits.len() > 16, "{low_bits:?}");
    }

    #[test]
    fn lexical_matches_content() {
        let owned = String::from("hello");
        assert_eq!(Lexical.hash_of(&owned), Lexical.hash_of("hello"));
        // Same recurrence as the classic string hash: "ab" = 97 * 31 + 98.
        assert_eq!(Lexical.hash_of("ab"), 97 * 31 + 98);
        assert_eq!(Lexical.compare("abc", "abd"), Ordering::Less);
    }

    #[test]
    fn non_null_rejects_none() {
        let c = NonNull::new(Direct::<FnvBuildHasher>::default());
        assert!(c.admits(&Some(3u8)));
        assert!(!c.admits(&None::<u8>));
        assert!(c.are_equal(&Some(3u8), &Some(3u8)));
        assert!(!c.are_equal(&Some(3u8), &None));
        assert_eq!(c.compare(&None, &Some(1u8)), Ordering::Less);
    }
}
