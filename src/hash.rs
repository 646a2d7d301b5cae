//! Hash function providers.
//!
//! Tables never hash keys themselves. They ask a [`HashFunctions`] provider
//! for the `n`th function's 64-bit hash of a key and reduce it against their
//! current capacity, which makes every function implicitly recomputed after
//! a resize.

use core::hash::BuildHasher;
use core::hash::Hash;
use core::hash::Hasher;

use crate::config::DEFAULT_CUCKOO_WAYS;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Hasher builder used when no provider is given.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// Hasher builder used when no provider is given.
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    } else {
        /// Hasher builder used when no provider is given.
        ///
        /// Without `foldhash` or `std` there is no randomly seeded hasher, so
        /// this falls back to an unkeyed SipHash.
        #[allow(deprecated)]
        pub type DefaultHashBuilder = core::hash::BuildHasherDefault<core::hash::SipHasher>;
    }
}

/// A family of independent, deterministic hash functions over `K`.
///
/// Cuckoo tables use every function as one candidate slot; robin-hood
/// tables only use function `0`.
pub trait HashFunctions<K: ?Sized> {
    /// Number of functions in the family.
    fn count(&self) -> usize;

    /// Hashes `key` with function number `function` (`< count()`).
    fn hash(&self, function: usize, key: &K) -> u64;
}

impl<K: ?Sized, H: HashFunctions<K> + ?Sized> HashFunctions<K> for &H {
    fn count(&self) -> usize {
        (**self).count()
    }

    fn hash(&self, function: usize, key: &K) -> u64 {
        (**self).hash(function, key)
    }
}

/// Derives `count` hash functions from a single [`BuildHasher`].
///
/// Function `n` feeds `n` into a fresh hasher before the key, so each
/// function sees a differently salted input.
///
/// ```rust
/// use skmap::hash::HashFamily;
/// use skmap::hash::HashFunctions;
///
/// let family = HashFamily::<foldhash::fast::RandomState>::with_count(3);
/// assert_eq!(HashFunctions::<u64>::count(&family), 3);
/// assert_eq!(family.hash(1, &42u64), family.hash(1, &42u64));
/// ```
#[derive(Debug, Clone)]
pub struct HashFamily<S = DefaultHashBuilder> {
    hash_builder: S,
    count: usize,
}

impl<S> HashFamily<S> {
    /// Wraps `hash_builder` into a family of `count` functions.
    pub fn new(hash_builder: S, count: usize) -> Self {
        Self {
            hash_builder,
            count,
        }
    }

    /// Returns the underlying hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }
}

impl<S: Default> HashFamily<S> {
    /// Creates a family of `count` functions over a default hasher builder.
    pub fn with_count(count: usize) -> Self {
        Self::new(S::default(), count)
    }
}

impl<S: Default> Default for HashFamily<S> {
    fn default() -> Self {
        Self::with_count(DEFAULT_CUCKOO_WAYS)
    }
}

impl<K, S> HashFunctions<K> for HashFamily<S>
where
    K: Hash + ?Sized,
    S: BuildHasher,
{
    fn count(&self) -> usize {
        self.count
    }

    #[inline]
    fn hash(&self, function: usize, key: &K) -> u64 {
        let mut hasher = self.hash_builder.build_hasher();
        hasher.write_usize(function);
        key.hash(&mut hasher);
        hasher.finish()
    }
}

/// Reduces a 64-bit hash to a slot index under `mask` (`capacity - 1`).
#[inline(always)]
pub(crate) fn slot_index(hash: u64, mask: usize) -> usize {
    (hash as usize) & mask
}
