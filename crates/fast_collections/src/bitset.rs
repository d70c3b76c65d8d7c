//! Dense set of small non-negative integers, one bit per value.

use std::fmt::{self, Debug, Display, Formatter};
use std::ops::Range;

use itertools::Itertools;

/// Bit set stored as a growable array of 64-bit words.
///
/// Words at or beyond `words.len()` are implicitly zero; trailing zero words may or may not be
/// materialized, and never affect equality.
#[derive(Clone, Default)]
pub struct FastBitSet {
    words: Vec<u64>,
}

#[inline]
fn word_of(bit: usize) -> usize {
    bit >> 6
}

#[inline]
fn mask_of(bit: usize) -> u64 {
    1 << (bit & 63)
}

impl FastBitSet {
    /// Creates an empty bit set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty bit set with room for the values `0..bits`.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: Vec::with_capacity(bits.div_ceil(64)),
        }
    }

    fn ensure_words(&mut self, len: usize) {
        if self.words.len() < len {
            self.words.resize(len, 0);
        }
    }

    /// Returns whether `bit` is set.
    pub fn get(&self, bit: usize) -> bool {
        self.words
            .get(word_of(bit))
            .is_some_and(|word| word & mask_of(bit) != 0)
    }

    /// Sets `bit`. Returns `true` if it was not set before.
    pub fn set(&mut self, bit: usize) -> bool {
        let word = word_of(bit);
        self.ensure_words(word + 1);
        let was_set = self.words[word] & mask_of(bit) != 0;
        self.words[word] |= mask_of(bit);
        !was_set
    }

    /// Sets or clears `bit`.
    pub fn set_to(&mut self, bit: usize, value: bool) {
        if value {
            self.set(bit);
        } else {
            self.clear_bit(bit);
        }
    }

    /// Clears `bit`. Returns `true` if it was set before.
    pub fn clear_bit(&mut self, bit: usize) -> bool {
        match self.words.get_mut(word_of(bit)) {
            Some(word) => {
                let was_set = *word & mask_of(bit) != 0;
                *word &= !mask_of(bit);
                was_set
            }
            None => false,
        }
    }

    /// Inverts `bit`.
    pub fn flip(&mut self, bit: usize) {
        let word = word_of(bit);
        self.ensure_words(word + 1);
        self.words[word] ^= mask_of(bit);
    }

    /// Applies `op(word, mask)` to every word overlapping `range`, where `mask` selects the bits
    /// of the word that fall inside the range.
    fn update_range(&mut self, range: Range<usize>, grow: bool, op: impl Fn(u64, u64) -> u64) {
        if range.is_empty() {
            return;
        }
        let first = word_of(range.start);
        let last = word_of(range.end - 1);
        if grow {
            self.ensure_words(last + 1);
        }
        let end = (last + 1).min(self.words.len());
        for word in first..end {
            let mut mask = u64::MAX;
            if word == first {
                mask &= u64::MAX << (range.start & 63);
            }
            if word == last {
                mask &= u64::MAX >> (63 - ((range.end - 1) & 63));
            }
            self.words[word] = op(self.words[word], mask);
        }
    }

    /// Sets every bit in `range`. An empty or inverted range does nothing.
    pub fn set_range(&mut self, range: Range<usize>) {
        self.update_range(range, true, |word, mask| word | mask);
    }

    /// Clears every bit in `range`.
    pub fn clear_range(&mut self, range: Range<usize>) {
        self.update_range(range, false, |word, mask| word & !mask);
    }

    /// Inverts every bit in `range`.
    pub fn flip_range(&mut self, range: Range<usize>) {
        self.update_range(range, true, |word, mask| word ^ mask);
    }

    /// New bit set holding only the bits of `range` (at their original positions).
    pub fn get_range(&self, range: Range<usize>) -> FastBitSet {
        let mut result = FastBitSet {
            words: self.words[..self.words.len().min(word_of(range.end) + 1)].to_vec(),
        };
        let end_bit = result.words.len() * 64;
        result.clear_range(0..range.start);
        result.clear_range(range.end..end_bit);
        result
    }

    /// Clears every bit.
    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Number of set bits.
    pub fn cardinality(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Returns `true` if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    /// Index of the highest set bit plus one, or zero if no bit is set.
    pub fn length(&self) -> usize {
        self.words
            .iter()
            .rposition(|&word| word != 0)
            .map_or(0, |i| 64 * i + 64 - self.words[i].leading_zeros() as usize)
    }

    /// Smallest set bit at or after `from`.
    pub fn next_set_bit(&self, from: usize) -> Option<usize> {
        let mut word = word_of(from);
        let mut bits = *self.words.get(word)? & (u64::MAX << (from & 63));
        loop {
            if bits != 0 {
                return Some(word * 64 + bits.trailing_zeros() as usize);
            }
            word += 1;
            bits = *self.words.get(word)?;
        }
    }

    /// Smallest clear bit at or after `from`.
    pub fn next_clear_bit(&self, from: usize) -> usize {
        let mut word = word_of(from);
        let Some(&first) = self.words.get(word) else {
            return from;
        };
        let mut bits = !first & (u64::MAX << (from & 63));
        loop {
            if bits != 0 {
                return word * 64 + bits.trailing_zeros() as usize;
            }
            word += 1;
            match self.words.get(word) {
                Some(&next) => bits = !next,
                None => return word * 64,
            }
        }
    }

    /// Iterates over the set bits in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.next_set_bit(0), move |&bit| self.next_set_bit(bit + 1))
    }

    /// Keeps only the bits that are also set in `other`.
    pub fn and(&mut self, other: &FastBitSet) {
        self.words.truncate(other.words.len());
        for (word, theirs) in self.words.iter_mut().zip(&other.words) {
            *word &= theirs;
        }
    }

    /// Adds the bits set in `other`.
    pub fn or(&mut self, other: &FastBitSet) {
        self.ensure_words(other.words.len());
        for (word, theirs) in self.words.iter_mut().zip(&other.words) {
            *word |= theirs;
        }
    }

    /// Inverts the bits set in `other`.
    pub fn xor(&mut self, other: &FastBitSet) {
        self.ensure_words(other.words.len());
        for (word, theirs) in self.words.iter_mut().zip(&other.words) {
            *word ^= theirs;
        }
    }

    /// Clears the bits set in `other`.
    pub fn and_not(&mut self, other: &FastBitSet) {
        for (word, theirs) in self.words.iter_mut().zip(&other.words) {
            *word &= !theirs;
        }
    }

    /// Returns `true` if some bit is set in both sets.
    pub fn intersects(&self, other: &FastBitSet) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .any(|(ours, theirs)| ours & theirs != 0)
    }
}

impl PartialEq for FastBitSet {
    fn eq(&self, other: &Self) -> bool {
        let common = self.words.len().min(other.words.len());
        self.words[..common] == other.words[..common]
            && self.words[common..].iter().all(|&word| word == 0)
            && other.words[common..].iter().all(|&word| word == 0)
    }
}

impl Eq for FastBitSet {}

impl Display for FastBitSet {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{{{}}}", self.iter().join(", "))
    }
}

impl Debug for FastBitSet {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Extend<usize> for FastBitSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for bit in iter {
            self.set(bit);
        }
    }
}

impl FromIterator<usize> for FastBitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
