use thiserror::Error;

/// Errors surfaced by operations that may need to grow a table.
///
/// Every variant means the table could not reach a larger (or different)
/// capacity. The table is left exactly as it was before the failing call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The next capacity does not fit in a `usize`.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// The allocator refused the backing storage for a resize.
    #[error("memory allocation of {slots} slots failed")]
    AllocError {
        /// Number of slots that were requested.
        slots: usize,
    },

    /// No placement for every entry was found up to the given capacity.
    ///
    /// Only the cuckoo table reports this, when its hash functions keep
    /// sending more keys to the same candidate slots than those slots can
    /// hold, no matter how far the table grows.
    #[error("no placement found for every entry up to {capacity} slots")]
    PlacementFailed {
        /// The last capacity that was tried.
        capacity: usize,
    },

    /// The table was configured with invalid knobs.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The maximum load factor must lie in `(0, 1]`.
    #[error("max load factor must be in (0, 1], got {0}")]
    LoadFactor(f64),

    /// The growth factor must be at least two.
    #[error("growth factor must be at least 2, got {0}")]
    GrowthFactor(usize),

    /// The eviction chain limit must allow at least one eviction.
    #[error("eviction limit must be non-zero")]
    EvictionLimit,

    /// Cuckoo resizing must be allowed to try at least one capacity.
    #[error("max resize steps must be non-zero")]
    ResizeSteps,

    /// The hash provider does not supply enough functions for the engine.
    #[error("{engine} tables need at least {required} hash functions, provider has {provided}")]
    HashFunctions {
        /// Engine that rejected the provider.
        engine: &'static str,
        /// Minimum number of functions the engine needs.
        required: usize,
        /// Number of functions the provider supplies.
        provided: usize,
    },
}

impl Eq for ConfigError {}

/// A broken table invariant found by `check_invariants`.
///
/// These are programming defects, not runtime conditions: a correct table
/// never produces one.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// The same key occupies two slots.
    #[error("key at slot {first} is duplicated at slot {second}")]
    DuplicateKey {
        /// First slot holding the key.
        first: usize,
        /// Second slot holding the key.
        second: usize,
    },

    /// An entry sits in a slot its hash functions never map it to.
    #[error("entry at slot {slot} is not at any of its candidate slots")]
    Misplaced {
        /// Slot of the misplaced entry.
        slot: usize,
    },

    /// An empty slot breaks the probe run that leads to an entry.
    #[error("probe run ending at slot {slot} has a gap")]
    Gap {
        /// Slot of the entry whose run has a gap.
        slot: usize,
    },

    /// The recorded length does not match the number of occupied slots.
    #[error("table records {recorded} entries but holds {counted}")]
    LengthMismatch {
        /// Value of the length counter.
        recorded: usize,
        /// Occupied slots actually found.
        counted: usize,
    },

    /// The table holds more entries than its load factor permits.
    #[error("{len} entries exceed the limit of {max_len}")]
    Overloaded {
        /// Number of entries.
        len: usize,
        /// Limit derived from capacity and load factor.
        max_len: usize,
    },
}
