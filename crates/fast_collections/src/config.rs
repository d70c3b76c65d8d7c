//! Growth constants and construction-time options.
//!
//! There are no process-wide switches. Anything that influences the behavior of a collection is
//! passed in when the collection is created.

/// Initial capacity in bits.
pub const B0: u32 = 4;
/// Initial capacity (16).
pub const C0: usize = 1 << B0;
/// Low block maximum capacity in bits.
pub const B1: u32 = 10;
/// Low block maximum capacity (1024). Also the largest flat hash table that is grown by copying.
pub const C1: usize = 1 << B1;
/// Mask for the offset within a block.
pub const M1: usize = C1 - 1;
/// Sub-table fan-out in bits.
pub const B2: u32 = B1 - B0;
/// Number of sub-tables a hash table splits into (64).
pub const C2: usize = 1 << B2;

/// Options for a [`NodePool`](crate::NodePool).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of records allocated at once when the free list runs dry.
    pub batch: usize,
    /// Number of records allocated up front.
    pub initial: usize,
}

impl PoolConfig {
    /// Creates a new pool configuration.
    pub const fn new(batch: usize, initial: usize) -> Self {
        // A zero batch would never make progress when the free list is empty.
        let batch = if batch == 0 { 1 } else { batch };
        Self { batch, initial }
    }

    /// Configuration used for linked sequences: nodes come in bursts of 4.
    pub const fn sequence() -> Self {
        Self::new(4, 0)
    }

    /// Configuration used for hash maps: entries come in bursts of 8.
    pub const fn map() -> Self {
        Self::new(8, 0)
    }

    /// Same configuration, but with `initial` records allocated up front.
    pub const fn with_initial(self, initial: usize) -> Self {
        Self::new(self.batch, initial)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::sequence()
    }
}
