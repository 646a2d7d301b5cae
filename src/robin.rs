//! Robin-hood hashing.
//!
//! Linear probing where every entry remembers the hash that placed it. The
//! *distance* of an entry is how far it sits past its ideal slot. While
//! probing, an entry whose distance is smaller than the distance of the
//! entry being inserted gives up its slot and continues probing itself, so
//! distances along a run never jump by more than one.
//!
//! That ordering lets a lookup stop as soon as it meets an empty slot or an
//! entry closer to its ideal slot than the probe is, and lets removal close
//! the hole by shifting the rest of the run back one slot instead of
//! leaving a tombstone.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;
use core::iter::FusedIterator;
use core::mem;

use crate::config::RobinConfig;
use crate::error::ConfigError;
use crate::error::TableError;
use crate::hash::HashFamily;
use crate::hash::HashFunctions;
use crate::hash::slot_index;
use crate::hash_table;
use crate::hash_table::HashTable;

#[derive(Clone)]
struct Bucket<K, V> {
    hash: u64,
    key: K,
    value: V,
}

/// Number of slots between `index` and the ideal slot of `hash`, wrapping
/// around the end of the table.
#[inline(always)]
fn distance(index: usize, hash: u64, mask: usize) -> usize {
    index.wrapping_sub(slot_index(hash, mask)) & mask
}

/// A hash table using robin-hood linear probing.
///
/// Keys are hashed once, with function `0` of the provider `H`.
///
/// ## Example
///
/// ```rust
/// use skmap::RobinTable;
///
/// let mut table = RobinTable::new();
/// for word in ["red", "green", "blue"] {
///     table.insert(word, word.len()).unwrap();
/// }
/// assert_eq!(table.get(&"green"), Some(&5));
/// assert_eq!(table.remove(&"red"), Some(3));
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Clone)]
pub struct RobinTable<K, V, H = HashFamily> {
    buckets: Vec<Option<Bucket<K, V>>>,
    len: usize,
    max_len: usize,
    hashers: H,
    config: RobinConfig,
}

impl<K, V, H> Debug for RobinTable<K, V, H>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Hash, V> RobinTable<K, V, HashFamily> {
    /// Creates an empty table that allocates on first insert.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a table with at least `capacity` slots, rounded up to a power
    /// of two.
    ///
    /// # Panics
    ///
    /// Panics if the rounded capacity overflows `usize` or cannot be
    /// allocated.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hashers(capacity, HashFamily::default())
    }
}

impl<K, V, H> Default for RobinTable<K, V, H>
where
    H: HashFunctions<K> + Default,
{
    fn default() -> Self {
        Self::with_capacity_and_hashers(0, H::default())
    }
}

impl<K, V, H> RobinTable<K, V, H>
where
    H: HashFunctions<K>,
{
    /// Creates a table with at least `capacity` slots that hashes keys with
    /// `hashers`.
    ///
    /// # Panics
    ///
    /// Panics if `hashers` supplies no functions, or if the capacity
    /// overflows or cannot be allocated.
    pub fn with_capacity_and_hashers(capacity: usize, hashers: H) -> Self {
        Self::with_config(capacity, RobinConfig::default(), hashers)
    }

    /// Creates a table with explicit tuning knobs.
    ///
    /// # Panics
    ///
    /// Panics wherever [`try_with_config`](Self::try_with_config) would
    /// return an error.
    pub fn with_config(capacity: usize, config: RobinConfig, hashers: H) -> Self {
        match Self::try_with_config(capacity, config, hashers) {
            Ok(table) => table,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates a table with explicit tuning knobs, reporting invalid
    /// configuration and allocation failure as errors.
    pub fn try_with_config(
        capacity: usize,
        config: RobinConfig,
        hashers: H,
    ) -> Result<Self, TableError> {
        config.validate()?;
        let provided = hashers.count();
        if provided < 1 {
            return Err(ConfigError::HashFunctions {
                engine: "robin",
                required: 1,
                provided,
            }
            .into());
        }

        let capacity = hash_table::capacity_for(capacity)?;
        let buckets = hash_table::alloc_slots(capacity)?;
        Ok(Self {
            buckets,
            len: 0,
            max_len: hash_table::max_len(capacity, config.max_load_factor),
            hashers,
            config,
        })
    }
}

impl<K, V, H> RobinTable<K, V, H> {
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the current ratio of entries to slots.
    pub fn load_factor(&self) -> f64 {
        if self.buckets.is_empty() {
            0.0
        } else {
            self.len as f64 / self.buckets.len() as f64
        }
    }

    /// Returns the hash function provider.
    pub fn hashers(&self) -> &H {
        &self.hashers
    }

    /// Returns the tuning knobs this table was built with.
    pub fn config(&self) -> &RobinConfig {
        &self.config
    }

    /// Removes every entry, keeping the allocated slots.
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(|bucket| *bucket = None);
        self.len = 0;
    }

    /// Returns an iterator over `(&K, &V)` pairs in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            remaining: self.len,
        }
    }

    /// Returns an iterator over the keys in slot order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values in slot order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Removes and yields every entry. The table keeps its slots.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            buckets: self.buckets.iter_mut(),
            len: &mut self.len,
        }
    }

    #[inline(always)]
    fn mask(&self) -> usize {
        self.buckets.len().wrapping_sub(1)
    }

    /// Places an entry known to be absent.
    ///
    /// The caller guarantees at least one empty slot.
    fn place(&mut self, hand: Bucket<K, V>) {
        place_into(&mut self.buckets, hand);
    }

    /// Moves every entry into new storage of `capacity` slots.
    ///
    /// The new storage is filled before it replaces the old one.
    fn resize(&mut self, capacity: usize) -> Result<(), TableError> {
        let mut buckets = hash_table::alloc_slots(capacity)?;

        // Nothing below can fail.
        for bucket in self.buckets.iter_mut().filter_map(Option::take) {
            place_into(&mut buckets, bucket);
        }
        let from = mem::replace(&mut self.buckets, buckets).len();
        self.max_len = hash_table::max_len(capacity, self.config.max_load_factor);

        log::debug!(
            "robin table resized from {from} to {capacity} slots with {} entries",
            self.len
        );
        Ok(())
    }
}

/// Robin-hood placement of `hand` into `buckets`, which must hold at least
/// one empty slot. Ties keep the occupant.
fn place_into<K, V>(buckets: &mut [Option<Bucket<K, V>>], mut hand: Bucket<K, V>) {
    let mask = buckets.len().wrapping_sub(1);
    let mut index = slot_index(hand.hash, mask);
    let mut dist = 0;
    loop {
        let bucket = &mut buckets[index];
        match bucket {
            None => {
                *bucket = Some(hand);
                return;
            }
            Some(occupant) => {
                let occupant_dist = distance(index, occupant.hash, mask);
                if occupant_dist < dist {
                    mem::swap(occupant, &mut hand);
                    dist = occupant_dist;
                }
            }
        }
        index = (index + 1) & mask;
        dist += 1;
        debug_assert!(dist <= mask, "probe wrapped around a full table");
    }
}

impl<K, V, H> RobinTable<K, V, H>
where
    K: Eq,
    H: HashFunctions<K>,
{
    /// Inserts `value` under `key`, returning the value it replaced.
    ///
    /// A new key resizes the table first if it is at its load limit. On
    /// error the table is unchanged and `value` is dropped.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        let hash = self.hash_key(&key);
        if let Some(index) = self.find_index(hash, &key)
            && let Some(bucket) = &mut self.buckets[index]
        {
            return Ok(Some(mem::replace(&mut bucket.value, value)));
        }

        if self.len >= self.max_len {
            let capacity = hash_table::capacity_to_hold(
                self.buckets.len(),
                self.len + 1,
                self.config.growth_factor,
                self.config.max_load_factor,
            )?;
            self.resize(capacity)?;
        }

        self.place(Bucket { hash, key, value });
        self.len += 1;
        Ok(None)
    }

    /// Returns a reference to the value stored under `key`.
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`.
    #[inline]
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let index = self.find_index(self.hash_key(key), key)?;
        self.buckets[index].as_ref().map(|b| (&b.key, &b.value))
    }

    /// Returns a mutable reference to the value stored under `key`.
    #[inline]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = self.find_index(self.hash_key(key), key)?;
        self.buckets[index].as_mut().map(|b| &mut b.value)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find_index(self.hash_key(key), key).is_some()
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and value.
    ///
    /// Every following entry of the run that is not at its ideal slot moves
    /// back by one, so no tombstone is left behind.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let mut index = self.find_index(self.hash_key(key), key)?;
        let removed = self.buckets[index].take()?;
        self.len -= 1;

        let mask = self.mask();
        loop {
            let next = (index + 1) & mask;
            match &self.buckets[next] {
                Some(bucket) if distance(next, bucket.hash, mask) > 0 => {}
                _ => break,
            }
            self.buckets[index] = self.buckets[next].take();
            index = next;
        }

        Some((removed.key, removed.value))
    }

    /// Makes room for at least `additional` more entries without a resize.
    pub fn reserve(&mut self, additional: usize) -> Result<(), TableError> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(TableError::CapacityOverflow)?;
        if required <= self.max_len {
            return Ok(());
        }

        let capacity = hash_table::min_capacity_for(required, self.config.max_load_factor)?;
        self.resize(capacity.max(self.buckets.len()))
    }

    /// Shrinks the table to the smallest capacity that holds its entries
    /// under the load factor. An empty table releases its storage.
    pub fn shrink_to_fit(&mut self) -> Result<(), TableError> {
        let capacity = hash_table::min_capacity_for(self.len, self.config.max_load_factor)?;
        if capacity >= self.buckets.len() {
            return Ok(());
        }
        self.resize(capacity)
    }

    #[inline(always)]
    fn hash_key(&self, key: &K) -> u64 {
        self.hashers.hash(0, key)
    }

    fn find_index(&self, hash: u64, key: &K) -> Option<usize> {
        if self.len == 0 {
            return None;
        }

        let mask = self.mask();
        let mut index = slot_index(hash, mask);
        for dist in 0..self.buckets.len() {
            let bucket = self.buckets[index].as_ref()?;
            if distance(index, bucket.hash, mask) < dist {
                return None;
            }
            if bucket.hash == hash && bucket.key == *key {
                return Some(index);
            }
            index = (index + 1) & mask;
        }
        None
    }
}

impl<K, V, H> HashTable<K, V> for RobinTable<K, V, H>
where
    K: Eq,
    H: HashFunctions<K>,
{
    fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        RobinTable::insert(self, key, value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        RobinTable::get(self, key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        RobinTable::get_mut(self, key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        RobinTable::remove(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(any(test, feature = "stats"))]
impl<K, V, H> RobinTable<K, V, H>
where
    K: Eq,
    H: HashFunctions<K>,
{
    /// Counts entries by distance from their ideal slot.
    ///
    /// Bin `d` holds the entries a lookup reaches after `d + 1` probes. The
    /// result ends at the largest distance present.
    pub fn probe_histogram(&self) -> Vec<usize> {
        let mask = self.mask();
        let mut hist = Vec::new();
        for (index, bucket) in self.buckets.iter().enumerate() {
            let Some(bucket) = bucket else { continue };
            let dist = distance(index, bucket.hash, mask);
            if hist.len() <= dist {
                hist.resize(dist + 1, 0);
            }
            hist[dist] += 1;
        }
        hist
    }

    /// Returns occupancy and memory statistics.
    pub fn debug_stats(&self) -> crate::stats::DebugStats {
        crate::stats::DebugStats::new::<Option<Bucket<K, V>>>(
            self.len,
            self.buckets.len(),
            self.max_len,
            self.config.max_load_factor,
            self.probe_histogram().len(),
        )
    }

    /// Verifies hashes, run ordering, uniqueness, length, and load-factor
    /// invariants.
    pub fn check_invariants(&self) -> Result<(), crate::error::InvariantViolation> {
        use crate::error::InvariantViolation;

        let mask = self.mask();
        let mut counted = 0;
        for (index, bucket) in self.buckets.iter().enumerate() {
            let Some(bucket) = bucket else { continue };
            counted += 1;

            if bucket.hash != self.hash_key(&bucket.key) {
                return Err(InvariantViolation::Misplaced { slot: index });
            }

            let dist = distance(index, bucket.hash, mask);
            if dist > 0 {
                let prev = index.wrapping_sub(1) & mask;
                match &self.buckets[prev] {
                    None => return Err(InvariantViolation::Gap { slot: index }),
                    Some(p) if distance(prev, p.hash, mask) + 1 < dist => {
                        return Err(InvariantViolation::Misplaced { slot: index });
                    }
                    Some(_) => {}
                }
            }

            match self.find_index(bucket.hash, &bucket.key) {
                Some(found) if found == index => {}
                Some(found) => {
                    return Err(InvariantViolation::DuplicateKey {
                        first: found.min(index),
                        second: found.max(index),
                    });
                }
                None => return Err(InvariantViolation::Misplaced { slot: index }),
            }
        }

        if counted != self.len {
            return Err(InvariantViolation::LengthMismatch {
                recorded: self.len,
                counted,
            });
        }
        if self.len > self.max_len {
            return Err(InvariantViolation::Overloaded {
                len: self.len,
                max_len: self.max_len,
            });
        }
        Ok(())
    }
}

impl<'a, K, V, H> IntoIterator for &'a RobinTable<K, V, H> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the entries of a [`RobinTable`].
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Option<Bucket<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for bucket in self.buckets.by_ref() {
            if let Some(bucket) = bucket {
                self.remaining -= 1;
                return Some((&bucket.key, &bucket.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a [`RobinTable`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An iterator over the values of a [`RobinTable`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// A draining iterator over the entries of a [`RobinTable`].
pub struct Drain<'a, K, V> {
    buckets: core::slice::IterMut<'a, Option<Bucket<K, V>>>,
    // The table's own count, decremented as entries are taken so the table
    // stays consistent even if the drain is leaked.
    len: &'a mut usize,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        for bucket in self.buckets.by_ref() {
            if let Some(bucket) = bucket.take() {
                *self.len -= 1;
                return Some((bucket.key, bucket.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (*self.len, Some(*self.len))
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}

impl<K, V> Drop for Drain<'_, K, V> {
    fn drop(&mut self) {
        for _ in &mut *self {}
    }
}
