//! Collections whose growth never costs a reallocation proportional to their size.
//!
//! The crate provides a family of in-memory collections for long-running processes that cannot
//! afford large one-shot reallocations:
//! -   [`FastTable`]: a two-level indexable array. It doubles a single low block while small and
//!     appends fixed-size blocks afterwards, so no growth step copies more than a constant number
//!     of elements.
//! -   [`FastSequence`]: a doubly-linked list with permanent sentinels whose nodes come from a
//!     [`NodePool`] in small batches and are recycled after removal.
//! -   [`FastMap`] / [`FastSet`]: an open-addressing hash table that splits into 64 sub-tables
//!     once it outgrows a flat array, while a single insertion-ordered chain threads through all
//!     of its entries.
//! -   [`FastBitSet`]: a dense bit set.
//!
//! Any of them can be wrapped in a [`Shared`] / [`SharedMap`] view (per-operation reader/writer
//! guards) or an [`Unmodifiable`] view (reads only), and saved/restored with [`persist`].
//!
//! Equality, hashing and admission of elements are decided by a [`Comparator`] chosen at
//! construction time; there is no global configuration.

#![deny(missing_docs)]

pub mod bitset;
pub mod comparator;
pub mod config;
pub mod error;
pub mod map;
pub mod persist;
pub mod pool;
pub mod sequence;
pub mod set;
pub mod shared;
pub mod table;
pub mod traits;
pub mod unmodifiable;

#[cfg(test)]
mod tests;

pub use bitset::FastBitSet;
pub use comparator::{Comparator, Direct, Lexical, NonNull, OrderComparator, Rehash};
pub use config::PoolConfig;
pub use error::{Error, Result};
pub use map::{EntryRef, FastMap, MapStatistics};
pub use persist::{restore, save, Persistent};
pub use pool::{Handle, NodePool};
pub use sequence::{FastSequence, NodeRef};
pub use set::FastSet;
pub use shared::{Shared, SharedMap, SharedSubList};
pub use table::FastTable;
pub use traits::{Collection, List, Map, Shareable};
pub use unmodifiable::Unmodifiable;
