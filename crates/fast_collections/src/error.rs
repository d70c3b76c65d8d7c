//! Errors reported by the collections.
//!
//! Every error is returned to the caller; nothing is retried or swallowed internally. Degraded
//! performance (for example an abandoned sub-table split) is logged, never reported here, because
//! it preserves correctness.

use thiserror::Error;

/// Main error type of the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Positional access outside `0..len` (or `0..=len` for insertions).
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The rejected index.
        index: usize,
        /// Length of the collection at the time of the call.
        len: usize,
    },

    /// A range argument that is inverted or reaches past the end.
    #[error("range {from}..{to} out of bounds for length {len}")]
    RangeOutOfBounds {
        /// Inclusive start of the rejected range.
        from: usize,
        /// Exclusive end of the rejected range.
        to: usize,
        /// Length of the collection at the time of the call.
        len: usize,
    },

    /// Peeking or popping an empty collection, or following a handle whose node is gone.
    #[error("no such element")]
    NoSuchElement,

    /// Mutating through an unmodifiable view.
    #[error("unsupported operation on an unmodifiable view: {operation}")]
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// The key comparator does not admit this key.
    #[error("null key rejected by the key comparator")]
    NullKey,

    /// The value comparator does not admit this value.
    #[error("null value rejected by the value comparator")]
    NullValue,

    /// A detached view found its backing collection changed behind its back.
    #[error("backing collection was structurally modified outside of this view")]
    ConcurrentStructuralChange,

    /// Restoring into a collection whose comparator differs from the saved one.
    #[error("comparator mismatch: expected {expected}, found {found}")]
    ComparatorMismatch {
        /// Descriptor of the comparator of the target collection.
        expected: &'static str,
        /// Descriptor read from the saved data.
        found: String,
    },

    /// Failure while encoding a collection.
    #[error("encoding failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failure while decoding a collection.
    #[error("decoding failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

impl Error {
    /// Shorthand for [`Error::Unsupported`].
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Checks that `index` addresses an existing element.
#[inline]
pub fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::IndexOutOfBounds { index, len })
    }
}

/// Checks that `index` is a valid insertion position, i.e. `index <= len`.
#[inline]
pub fn check_position(index: usize, len: usize) -> Result<()> {
    if index <= len {
        Ok(())
    } else {
        Err(Error::IndexOutOfBounds { index, len })
    }
}

/// Checks that `from..to` is a valid sub-range of `0..len`.
#[inline]
pub fn check_range(from: usize, to: usize, len: usize) -> Result<()> {
    if from <= to && to <= len {
        Ok(())
    } else {
        Err(Error::RangeOutOfBounds { from, to, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_helpers() {
        assert!(check_index(0, 1).is_ok());
        assert!(matches!(
            check_index(1, 1),
            Err(Error::IndexOutOfBounds { index: 1, len: 1 })
        ));
        assert!(check_position(1, 1).is_ok());
        assert!(check_position(2, 1).is_err());
        assert!(check_range(2, 2, 2).is_ok());
        assert!(matches!(
            check_range(3, 2, 5),
            Err(Error::RangeOutOfBounds { from: 3, to: 2, len: 5 })
        ));
    }

    #[test]
    fn messages() {
        assert_eq!(
            Error::IndexOutOfBounds { index: 7, len: 3 }.to_string(),
            "index 7 out of bounds for length 3"
        );
        assert_eq!(
            Error::unsupported("push").to_string(),
            "unsupported operation on an unmodifiable view: push"
        );
    }
}
