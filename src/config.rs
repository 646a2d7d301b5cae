//! Tuning knobs for both engines.
//!
//! The defaults for the load factors and for the number of cuckoo hash
//! functions are picked at compile time through cargo features, the same way
//! a density feature would. Every knob can also be set per table.

use crate::error::ConfigError;

cfg_if::cfg_if! {
    if #[cfg(feature = "four-way")] {
        /// Number of hash functions the default cuckoo provider supplies.
        pub const DEFAULT_CUCKOO_WAYS: usize = 4;
        const DEFAULT_CUCKOO_LOAD_FACTOR: f64 = 0.95;
    } else if #[cfg(feature = "three-way")] {
        /// Number of hash functions the default cuckoo provider supplies.
        pub const DEFAULT_CUCKOO_WAYS: usize = 3;
        const DEFAULT_CUCKOO_LOAD_FACTOR: f64 = 0.9;
    } else {
        /// Number of hash functions the default cuckoo provider supplies.
        pub const DEFAULT_CUCKOO_WAYS: usize = 2;
        const DEFAULT_CUCKOO_LOAD_FACTOR: f64 = 0.5;
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "density-ninety-five")] {
        const DEFAULT_ROBIN_LOAD_FACTOR: f64 = 0.95;
    } else if #[cfg(feature = "density-eighty")] {
        const DEFAULT_ROBIN_LOAD_FACTOR: f64 = 0.8;
    } else {
        const DEFAULT_ROBIN_LOAD_FACTOR: f64 = 0.9;
    }
}

/// Default resize growth factor for both engines.
pub const DEFAULT_GROWTH_FACTOR: usize = 2;

/// Default number of capacities a cuckoo resize tries before giving up.
pub const DEFAULT_MAX_RESIZE_STEPS: usize = 8;

/// Bound on the length of a single cuckoo eviction chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionLimit {
    /// At most this many evictions, regardless of capacity.
    Fixed(usize),
    /// At most `factor * log2(capacity)` evictions (and at least one).
    Scaled(usize),
}

impl EvictionLimit {
    /// Resolves the limit for a table with `capacity` slots.
    ///
    /// `capacity` is always a power of two, so its trailing zeros are its
    /// base-two logarithm.
    pub fn for_capacity(self, capacity: usize) -> usize {
        match self {
            EvictionLimit::Fixed(limit) => limit,
            EvictionLimit::Scaled(factor) => factor
                .saturating_mul(capacity.trailing_zeros() as usize)
                .max(1),
        }
    }

    fn is_zero(self) -> bool {
        matches!(self, EvictionLimit::Fixed(0) | EvictionLimit::Scaled(0))
    }
}

impl Default for EvictionLimit {
    fn default() -> Self {
        EvictionLimit::Scaled(8)
    }
}

/// Knobs for [`CuckooTable`](crate::CuckooTable).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuckooConfig {
    /// Occupied / capacity ratio that no successful insert may exceed.
    /// Reaching it makes the next new key resize the table first.
    pub max_load_factor: f64,
    /// Capacity multiplier applied on every resize step. The result is
    /// rounded up to a power of two.
    pub growth_factor: usize,
    /// Longest eviction chain an insert may run before resizing.
    pub eviction_limit: EvictionLimit,
    /// Number of successively larger capacities a resize tries before it
    /// reports [`TableError::PlacementFailed`](crate::TableError::PlacementFailed).
    pub max_resize_steps: usize,
}

impl Default for CuckooConfig {
    fn default() -> Self {
        Self {
            max_load_factor: DEFAULT_CUCKOO_LOAD_FACTOR,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            eviction_limit: EvictionLimit::default(),
            max_resize_steps: DEFAULT_MAX_RESIZE_STEPS,
        }
    }
}

impl CuckooConfig {
    /// Sets the maximum load factor.
    pub fn max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    /// Sets the growth factor.
    pub fn growth_factor(mut self, growth_factor: usize) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    /// Sets the eviction chain limit.
    pub fn eviction_limit(mut self, eviction_limit: EvictionLimit) -> Self {
        self.eviction_limit = eviction_limit;
        self
    }

    /// Sets how many capacities a resize may try.
    pub fn max_resize_steps(mut self, max_resize_steps: usize) -> Self {
        self.max_resize_steps = max_resize_steps;
        self
    }

    /// Checks every knob against its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_load_factor(self.max_load_factor)?;
        validate_growth_factor(self.growth_factor)?;
        if self.eviction_limit.is_zero() {
            return Err(ConfigError::EvictionLimit);
        }
        if self.max_resize_steps == 0 {
            return Err(ConfigError::ResizeSteps);
        }
        Ok(())
    }
}

/// Knobs for [`RobinTable`](crate::RobinTable).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobinConfig {
    /// Occupied / capacity ratio that no successful insert may exceed.
    pub max_load_factor: f64,
    /// Capacity multiplier applied on resize, rounded up to a power of two.
    pub growth_factor: usize,
}

impl Default for RobinConfig {
    fn default() -> Self {
        Self {
            max_load_factor: DEFAULT_ROBIN_LOAD_FACTOR,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl RobinConfig {
    /// Sets the maximum load factor.
    pub fn max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    /// Sets the growth factor.
    pub fn growth_factor(mut self, growth_factor: usize) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    /// Checks every knob against its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_load_factor(self.max_load_factor)?;
        validate_growth_factor(self.growth_factor)
    }
}

fn validate_load_factor(max_load_factor: f64) -> Result<(), ConfigError> {
    // NaN fails both comparisons.
    if max_load_factor > 0.0 && max_load_factor <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::LoadFactor(max_load_factor))
    }
}

fn validate_growth_factor(growth_factor: usize) -> Result<(), ConfigError> {
    if growth_factor >= 2 {
        Ok(())
    } else {
        Err(ConfigError::GrowthFactor(growth_factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(CuckooConfig::default().validate(), Ok(()));
        assert_eq!(RobinConfig::default().validate(), Ok(()));
    }

    #[test]
    fn scaled_limit_follows_log2_capacity() {
        let limit = EvictionLimit::Scaled(8);
        assert_eq!(limit.for_capacity(8), 24);
        assert_eq!(limit.for_capacity(1024), 80);
        // A single slot has log2 of zero; the chain still gets one step.
        assert_eq!(limit.for_capacity(1), 1);
        assert_eq!(EvictionLimit::Fixed(500).for_capacity(8), 500);
    }

    #[test]
    fn rejects_out_of_range_knobs() {
        let base = CuckooConfig::default();
        assert_eq!(
            base.max_load_factor(0.0).validate(),
            Err(ConfigError::LoadFactor(0.0))
        );
        assert_eq!(
            base.max_load_factor(1.5).validate(),
            Err(ConfigError::LoadFactor(1.5))
        );
        assert!(base.max_load_factor(f64::NAN).validate().is_err());
        assert_eq!(
            base.growth_factor(1).validate(),
            Err(ConfigError::GrowthFactor(1))
        );
        assert_eq!(
            base.eviction_limit(EvictionLimit::Fixed(0)).validate(),
            Err(ConfigError::EvictionLimit)
        );
        assert_eq!(
            base.max_resize_steps(0).validate(),
            Err(ConfigError::ResizeSteps)
        );
        assert_eq!(base.max_load_factor(1.0).validate(), Ok(()));

        assert_eq!(
            RobinConfig::default().growth_factor(0).validate(),
            Err(ConfigError::GrowthFactor(0))
        );
    }
}
