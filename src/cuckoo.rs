//! Cuckoo hashing.
//!
//! Every key has one candidate slot per hash function. A key always lives
//! in one of its candidates, so lookups and removals probe at most `k`
//! slots and removal never moves other entries.
//!
//! Inserting into a key whose candidates are all taken evicts one of the
//! occupants and relocates it to one of *its* other candidates, repeating
//! until an empty slot turns up or the chain reaches its
//! [`EvictionLimit`](crate::config::EvictionLimit). A chain that runs out is
//! undone step by step, so the table is back in its pre-insert state, and
//! the table resizes instead.
//!
//! Resizing plans the placement of every entry on slot indices first and
//! only moves entries once a complete plan and the new storage both exist,
//! so a failed resize never leaves entries behind.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;
use core::iter::FusedIterator;
use core::mem;

use crate::config::CuckooConfig;
use crate::error::ConfigError;
use crate::error::TableError;
use crate::hash::HashFamily;
use crate::hash::HashFunctions;
use crate::hash::slot_index;
use crate::hash_table;
use crate::hash_table::HashTable;

type Slot<K, V> = Option<(K, V)>;

/// A hash table using cuckoo hashing with `k` hash functions.
///
/// The number of functions comes from the [`HashFunctions`] provider `H`
/// and must be at least two.
///
/// ## Example
///
/// ```rust
/// use skmap::CuckooTable;
///
/// let mut table = CuckooTable::with_capacity(16);
/// assert_eq!(table.insert("apple", 3).unwrap(), None);
/// assert_eq!(table.insert("apple", 5).unwrap(), Some(3));
/// assert_eq!(table.get(&"apple"), Some(&5));
/// assert_eq!(table.remove(&"apple"), Some(5));
/// assert!(table.is_empty());
/// ```
#[derive(Clone)]
pub struct CuckooTable<K, V, H = HashFamily> {
    slots: Vec<Slot<K, V>>,
    len: usize,
    max_len: usize,
    hashers: H,
    config: CuckooConfig,
    // Slots touched by the current eviction chain, kept so a failed chain
    // can be undone. Reused across inserts.
    path: Vec<usize>,
}

impl<K, V, H> Debug for CuckooTable<K, V, H>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Hash, V> CuckooTable<K, V, HashFamily> {
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

impl<K, V, H> Default for CuckooTable<K, V, H>
where
    H: HashFunctions<K> + Default,
{
    fn default() -> Self {
        Self::with_capacity_and_hashers(0, H::default())
    }
}

impl<K, V, H> CuckooTable<K, V, H>
where
    H: HashFunctions<K>,
{
    /// Creates a table with at least `capacity` slots that hashes keys with
    /// `hashers`, using the default [`CuckooConfig`].
    ///
    /// # Panics
    ///
    /// Panics if `hashers` supplies fewer than two functions, or if the
    /// capacity overflows or cannot be allocated.
    pub fn with_capacity_and_hashers(capacity: usize, hashers: H) -> Self {
        Self::with_config(capacity, CuckooConfig::default(), hashers)
    }

    /// Creates a table with explicit tuning knobs.
    ///
    /// # Panics
    ///
    /// Panics wherever [`try_with_config`](Self::try_with_config) would
    /// return an error.
    pub fn with_config(capacity: usize, config: CuckooConfig, hashers: H) -> Self {
        match Self::try_with_config(capacity, config, hashers) {
            Ok(table) => table,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates a table with explicit tuning knobs, reporting invalid
    /// configuration and allocation failure as errors.
    ///
    /// ```rust
    /// use skmap::CuckooTable;
    /// use skmap::config::CuckooConfig;
    /// use skmap::config::EvictionLimit;
    /// use skmap::hash::HashFamily;
    ///
    /// let config = CuckooConfig::default()
    ///     .max_load_factor(0.45)
    ///     .eviction_limit(EvictionLimit::Fixed(500));
    /// let table: CuckooTable<u32, u32> =
    ///     CuckooTable::try_with_config(64, config, HashFamily::default()).unwrap();
    /// assert_eq!(table.capacity(), 64);
    ///
    /// let single = HashFamily::<foldhash::fast::RandomState>::with_count(1);
    /// assert!(CuckooTable::<u32, u32, _>::try_with_config(64, config, single).is_err());
    /// ```
    pub fn try_with_config(
        capacity: usize,
        config: CuckooConfig,
        hashers: H,
    ) -> Result<Self, TableError> {
        config.validate()?;
        let provided = hashers.count();
        if provided < 2 {
            return Err(ConfigError::HashFunctions {
                engine: "cuckoo",
                required: 2,
                provided,
            }
            .into());
        }

        let capacity = hash_table::capacity_for(capacity)?;
        let slots = hash_table::alloc_slots(capacity)?;
        Ok(Self {
            slots,
            len: 0,
            max_len: hash_table::max_len(capacity, config.max_load_factor),
            hashers,
            config,
            path: Vec::new(),
        })
    }
}

impl<K, V, H> CuckooTable<K, V, H> {
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
        self.slots.len()
    }

    /// Returns the current ratio of entries to slots.
    pub fn load_factor(&self) -> f64 {
        if self.slots.is_empty() {
            0.0
        } else {
            self.len as f64 / self.slots.len() as f64
        }
    }

    /// Returns the hash function provider.
    pub fn hashers(&self) -> &H {
        &self.hashers
    }

    /// Returns the tuning knobs this table was built with.
    pub fn config(&self) -> &CuckooConfig {
        &self.config
    }

    /// Removes every entry, keeping the allocated slots.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.len = 0;
    }

    /// Returns an iterator over `(&K, &V)` pairs in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.iter(),
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
    ///
    /// Entries not consumed before the iterator is dropped are dropped with
    /// it.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            slots: self.slots.iter_mut(),
            len: &mut self.len,
        }
    }

    #[inline(always)]
    fn mask(&self) -> usize {
        self.slots.len().wrapping_sub(1)
    }
}

impl<K, V, H> CuckooTable<K, V, H>
where
    K: Eq,
    H: HashFunctions<K>,
{
    /// Inserts `value` under `key`, returning the value it replaced.
    ///
    /// A new key is placed in an empty candidate slot when one exists and
    /// otherwise through an eviction chain. The table resizes first when it
    /// is at its load limit, and resizes instead when the chain exceeds its
    /// limit; in both cases the new entry is placed during the rebuild.
    ///
    /// On error the table is unchanged and `value` is dropped.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        if let Some(index) = self.find_index(&key)
            && let Some((_, existing)) = &mut self.slots[index]
        {
            return Ok(Some(mem::replace(existing, value)));
        }

        if self.len >= self.max_len {
            self.grow_with((key, value))?;
            return Ok(None);
        }

        match self.place((key, value)) {
            Ok(()) => self.len += 1,
            Err(entry) => self.grow_with(entry)?,
        }
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
        let index = self.find_index(key)?;
        self.slots[index].as_ref().map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value stored under `key`.
    #[inline]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = self.find_index(key)?;
        self.slots[index].as_mut().map(|(_, v)| v)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find_index(key).is_some()
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and value.
    ///
    /// Only the slot itself is vacated; no other entry moves.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let index = self.find_index(key)?;
        let entry = self.slots[index].take();
        if entry.is_some() {
            self.len -= 1;
        }
        entry
    }

    /// Makes room for at least `additional` more entries without a resize.
    ///
    /// ```rust
    /// use skmap::CuckooTable;
    ///
    /// let mut table = CuckooTable::new();
    /// table.reserve(100).unwrap();
    /// let capacity = table.capacity();
    /// for i in 0..100u32 {
    ///     table.insert(i, i).unwrap();
    /// }
    /// assert_eq!(table.capacity(), capacity);
    /// ```
    pub fn reserve(&mut self, additional: usize) -> Result<(), TableError> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(TableError::CapacityOverflow)?;
        if required <= self.max_len {
            return Ok(());
        }

        let capacity = hash_table::min_capacity_for(required, self.config.max_load_factor)?;
        self.rebuild(capacity.max(self.slots.len()), None)
    }

    /// Shrinks the table to the smallest capacity that holds its entries
    /// under the load factor. An empty table releases its storage.
    pub fn shrink_to_fit(&mut self) -> Result<(), TableError> {
        let capacity = hash_table::min_capacity_for(self.len, self.config.max_load_factor)?;
        if capacity >= self.slots.len() {
            return Ok(());
        }
        if capacity == 0 {
            self.slots = Vec::new();
            self.max_len = 0;
            return Ok(());
        }
        self.rebuild(capacity, None)
    }

    fn find_index(&self, key: &K) -> Option<usize> {
        if self.len == 0 {
            return None;
        }

        let mask = self.mask();
        (0..self.hashers.count())
            .map(|function| slot_index(self.hashers.hash(function, key), mask))
            .find(|&index| matches!(&self.slots[index], Some((k, _)) if k == key))
    }

    fn empty_candidate(&self, key: &K, mask: usize) -> Option<usize> {
        (0..self.hashers.count())
            .map(|function| slot_index(self.hashers.hash(function, key), mask))
            .find(|&index| self.slots[index].is_none())
    }

    /// Places a key that is known to be absent, running a bounded eviction
    /// chain if needed.
    ///
    /// On failure the chain is undone and the entry is handed back, leaving
    /// every slot as it was before the call.
    fn place(&mut self, entry: (K, V)) -> Result<(), (K, V)> {
        debug_assert!(self.len < self.slots.len(), "placing into a full table");
        let mask = self.mask();
        let count = self.hashers.count();
        let limit = self.config.eviction_limit.for_capacity(self.slots.len());
        self.path.clear();

        let mut hand = entry;
        let mut previous = None;
        loop {
            if let Some(index) = self.empty_candidate(&hand.0, mask) {
                self.slots[index] = Some(hand);
                return Ok(());
            }
            if self.path.len() == limit {
                break;
            }

            let victim = victim_slot(&self.hashers, count, &hand.0, mask, self.path.len(), previous);
            let slot = &mut self.slots[victim];
            match slot {
                Some(occupant) => mem::swap(occupant, &mut hand),
                None => {
                    *slot = Some(hand);
                    return Ok(());
                }
            }
            self.path.push(victim);
            previous = Some(victim);
        }

        log::trace!(
            "cuckoo eviction chain hit its limit of {limit} at {} slots, undoing",
            self.slots.len()
        );
        while let Some(index) = self.path.pop() {
            if let Some(occupant) = &mut self.slots[index] {
                mem::swap(occupant, &mut hand);
            }
        }
        Err(hand)
    }

    fn grow_with(&mut self, entry: (K, V)) -> Result<(), TableError> {
        let capacity = hash_table::capacity_to_hold(
            self.slots.len(),
            self.len + 1,
            self.config.growth_factor,
            self.config.max_load_factor,
        )?;
        self.rebuild(capacity, Some(entry))
    }

    /// Moves every entry, plus `pending`, into new storage of `capacity`
    /// slots, growing further while no complete placement exists.
    fn rebuild(&mut self, mut capacity: usize, mut pending: Option<(K, V)>) -> Result<(), TableError> {
        let from = self.slots.len();
        for step in 0..self.config.max_resize_steps {
            if step > 0 {
                capacity = hash_table::grown_capacity(capacity, self.config.growth_factor)?;
            }

            let Some(plan) = self.plan(capacity, pending.as_ref().map(|(k, _)| k))? else {
                log::warn!("cuckoo resize found no placement at {capacity} slots");
                continue;
            };
            let mut slots = hash_table::alloc_slots(capacity)?;

            // Nothing below can fail.
            let added = usize::from(pending.is_some());
            for (slot, source) in slots.iter_mut().zip(plan) {
                if let Some(source) = source {
                    *slot = match self.slots.get_mut(source) {
                        Some(old) => old.take(),
                        None => pending.take(),
                    };
                }
            }
            self.slots = slots;
            self.len += added;
            self.max_len = hash_table::max_len(capacity, self.config.max_load_factor);

            log::debug!(
                "cuckoo table resized from {from} to {capacity} slots with {} entries",
                self.len
            );
            return Ok(());
        }

        Err(TableError::PlacementFailed { capacity })
    }

    /// Computes a placement of every entry (and `pending`) into `capacity`
    /// slots without moving anything.
    ///
    /// Plan cells hold the index of the entry's current slot; the pending
    /// entry is addressed by the one-past-the-end index. Returns `None` if
    /// some entry could not be placed within the eviction limit.
    fn plan(
        &self,
        capacity: usize,
        pending: Option<&K>,
    ) -> Result<Option<Vec<Option<usize>>>, TableError> {
        let mut plan = hash_table::alloc_slots(capacity)?;
        let sources = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| index)
            .chain(pending.map(|_| self.slots.len()));

        let mask = capacity.wrapping_sub(1);
        let limit = self.config.eviction_limit.for_capacity(capacity);
        for source in sources {
            if capacity == 0 || !self.plan_one(&mut plan, mask, limit, source, pending) {
                return Ok(None);
            }
        }
        Ok(Some(plan))
    }

    fn plan_one(
        &self,
        plan: &mut [Option<usize>],
        mask: usize,
        limit: usize,
        source: usize,
        pending: Option<&K>,
    ) -> bool {
        let count = self.hashers.count();
        let mut hand = source;
        let mut previous = None;
        for turn in 0..=limit {
            let Some(key) = self.planned_key(hand, pending) else {
                return false;
            };
            if let Some(index) = (0..count)
                .map(|function| slot_index(self.hashers.hash(function, key), mask))
                .find(|&index| plan[index].is_none())
            {
                plan[index] = Some(hand);
                return true;
            }
            if turn == limit {
                break;
            }

            let victim = victim_slot(&self.hashers, count, key, mask, turn, previous);
            match plan[victim].replace(hand) {
                Some(evicted) => hand = evicted,
                None => return true,
            }
            previous = Some(victim);
        }
        false
    }

    fn planned_key<'a>(&'a self, source: usize, pending: Option<&'a K>) -> Option<&'a K> {
        match self.slots.get(source) {
            Some(slot) => slot.as_ref().map(|(k, _)| k),
            None => pending,
        }
    }
}

/// Picks the slot to evict for `key` on eviction number `turn`.
///
/// Candidates are tried in function order starting at `turn % count`, so
/// successive evictions in one chain rotate through the functions. The slot
/// the key was just evicted from is skipped unless it is the only choice.
fn victim_slot<K, H>(
    hashers: &H,
    count: usize,
    key: &K,
    mask: usize,
    turn: usize,
    previous: Option<usize>,
) -> usize
where
    K: ?Sized,
    H: HashFunctions<K>,
{
    let candidate = |offset: usize| slot_index(hashers.hash((turn + offset) % count, key), mask);
    (0..count)
        .map(candidate)
        .find(|&index| Some(index) != previous)
        .unwrap_or_else(|| candidate(0))
}

impl<K, V, H> HashTable<K, V> for CuckooTable<K, V, H>
where
    K: Eq,
    H: HashFunctions<K>,
{
    fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        CuckooTable::insert(self, key, value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        CuckooTable::get(self, key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        CuckooTable::get_mut(self, key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        CuckooTable::remove(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(any(test, feature = "stats"))]
impl<K, V, H> CuckooTable<K, V, H>
where
    K: Eq,
    H: HashFunctions<K>,
{
    /// Counts entries by the hash function that placed them.
    ///
    /// Bin `f` holds the entries whose first matching candidate is function
    /// `f`, which is also the number of probes minus one a lookup of that
    /// key takes. The result has one bin per function.
    pub fn probe_histogram(&self) -> Vec<usize> {
        let count = self.hashers.count();
        let mut hist = alloc::vec![0usize; count];
        let mask = self.mask();
        for (index, slot) in self.slots.iter().enumerate() {
            let Some((key, _)) = slot else { continue };
            if let Some(function) = (0..count)
                .find(|&function| slot_index(self.hashers.hash(function, key), mask) == index)
            {
                hist[function] += 1;
            }
        }
        hist
    }

    /// Returns occupancy and memory statistics.
    pub fn debug_stats(&self) -> crate::stats::DebugStats {
        let hist = self.probe_histogram();
        crate::stats::DebugStats::new::<Slot<K, V>>(
            self.len,
            self.slots.len(),
            self.max_len,
            self.config.max_load_factor,
            hist.iter().rposition(|&n| n > 0).map_or(0, |f| f + 1),
        )
    }

    /// Verifies placement, uniqueness, length, and load-factor invariants.
    pub fn check_invariants(&self) -> Result<(), crate::error::InvariantViolation> {
        use crate::error::InvariantViolation;

        let mask = self.mask();
        let count = self.hashers.count();
        let mut counted = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            let Some((key, _)) = slot else { continue };
            counted += 1;

            let mut at_candidate = false;
            for function in 0..count {
                let candidate = slot_index(self.hashers.hash(function, key), mask);
                if candidate == index {
                    at_candidate = true;
                } else if matches!(&self.slots[candidate], Some((k, _)) if k == key) {
                    return Err(InvariantViolation::DuplicateKey {
                        first: index.min(candidate),
                        second: index.max(candidate),
                    });
                }
            }
            if !at_candidate {
                return Err(InvariantViolation::Misplaced { slot: index });
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

impl<'a, K, V, H> IntoIterator for &'a CuckooTable<K, V, H> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the entries of a [`CuckooTable`].
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some((k, v)) = slot {
                self.remaining -= 1;
                return Some((k, v));
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

/// An iterator over the keys of a [`CuckooTable`].
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

/// An iterator over the values of a [`CuckooTable`].
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

/// A draining iterator over the entries of a [`CuckooTable`].
pub struct Drain<'a, K, V> {
    slots: core::slice::IterMut<'a, Slot<K, V>>,
    // The table's own count, decremented as entries are taken so the table
    // stays consistent even if the drain is leaked.
    len: &'a mut usize,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(entry) = slot.take() {
                *self.len -= 1;
                return Some(entry);
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

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;
    use crate::config::EvictionLimit;
    use crate::error::InvariantViolation;
    use crate::hash_table::contract::Inspect;
    use crate::hash_table::contract::contract_tests;
    use crate::hash_table::contract::sip_family;

    impl<H: HashFunctions<u64>> Inspect for CuckooTable<u64, u64, H> {
        fn max_len(&self) -> usize {
            self.max_len
        }

        fn check_invariants(&self) -> Result<(), InvariantViolation> {
            CuckooTable::check_invariants(self)
        }
    }

    contract_tests!(CuckooTable::<u64, u64, _>::with_capacity_and_hashers(0, sip_family(2)));

    mod three_way {
        use super::*;

        contract_tests!(CuckooTable::<u64, u64, _>::with_capacity_and_hashers(0, sip_family(3)));
    }

    /// Hash functions given as a fixed table of `(key, [h1, h2])` rows.
    struct FixedHashes(Vec<(u64, [u64; 2])>);

    impl HashFunctions<u64> for FixedHashes {
        fn count(&self) -> usize {
            2
        }

        fn hash(&self, function: usize, key: &u64) -> u64 {
            self.0
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, hashes)| hashes[function])
                .expect("key missing from the fixed hash table")
        }
    }

    const A: u64 = 0xA;
    const B: u64 = 0xB;
    const C: u64 = 0xC;
    const D: u64 = 0xD;
    const E: u64 = 0xE;
    const F: u64 = 0xF;
    const G: u64 = 0x10;
    const H: u64 = 0x11;
    const I: u64 = 0x12;

    fn scenario_hashes() -> FixedHashes {
        FixedHashes(vec![
            (A, [0, 1]),
            (B, [0, 2]),
            (C, [0, 2]),
            (D, [3, 4]),
            (E, [4, 5]),
            (F, [5, 6]),
            (G, [6, 7]),
            (H, [7, 3]),
            (I, [9, 10]),
        ])
    }

    fn slot_of<V, HF>(table: &CuckooTable<u64, V, HF>, key: u64) -> Option<usize> {
        table
            .slots
            .iter()
            .position(|slot| matches!(slot, Some((k, _)) if *k == key))
    }

    #[test]
    fn full_table_resizes_once_on_ninth_key() {
        let config = CuckooConfig::default().max_load_factor(1.0);
        let mut table = CuckooTable::with_config(8, config, scenario_hashes());

        for (n, key) in [A, B, C, D, E, F, G, H].into_iter().enumerate() {
            assert_eq!(table.insert(key, n), Ok(None));
            assert_eq!(table.capacity(), 8, "resized early at {key:#x}");
        }
        assert_eq!(table.len(), 8);
        assert_eq!(table.load_factor(), 1.0);

        // C evicted A from slot 0 and A moved on to its second candidate.
        assert_eq!(slot_of(&table, C), Some(0));
        assert_eq!(slot_of(&table, A), Some(1));
        assert_eq!(slot_of(&table, B), Some(2));
        assert_eq!(slot_of(&table, H), Some(7));

        assert_eq!(table.insert(I, 8), Ok(None));
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.len(), 9);
        for (n, key) in [A, B, C, D, E, F, G, H, I].into_iter().enumerate() {
            assert_eq!(table.get(&key), Some(&n), "lost {key:#x}");
        }
        assert_eq!(slot_of(&table, I), Some(9));
        assert_eq!(table.check_invariants(), Ok(()));
    }

    #[test]
    fn eviction_chain_relocates_occupants() {
        let hashes = FixedHashes(vec![(A, [0, 1]), (B, [1, 2]), (C, [0, 1])]);
        let mut table = CuckooTable::with_capacity_and_hashers(8, hashes);

        table.insert(A, 'a').unwrap();
        table.insert(B, 'b').unwrap();
        assert_eq!(slot_of(&table, A), Some(0));
        assert_eq!(slot_of(&table, B), Some(1));

        // C takes slot 0, A rotates to its second function and takes slot 1,
        // B then finds slot 2 empty.
        table.insert(C, 'c').unwrap();
        assert_eq!(slot_of(&table, C), Some(0));
        assert_eq!(slot_of(&table, A), Some(1));
        assert_eq!(slot_of(&table, B), Some(2));
        assert_eq!(table.capacity(), 8);
        assert_eq!(table.check_invariants(), Ok(()));
    }

    #[test]
    fn victim_rotates_and_skips_previous_slot() {
        let hashes = FixedHashes(vec![(A, [3, 5]), (B, [4, 4])]);
        let mask = 7;

        assert_eq!(victim_slot(&hashes, 2, &A, mask, 0, None), 3);
        assert_eq!(victim_slot(&hashes, 2, &A, mask, 1, None), 5);
        assert_eq!(victim_slot(&hashes, 2, &A, mask, 0, Some(3)), 5);
        assert_eq!(victim_slot(&hashes, 2, &A, mask, 1, Some(5)), 3);
        // Both candidates are the previous slot: it is the only choice.
        assert_eq!(victim_slot(&hashes, 2, &B, mask, 0, Some(4)), 4);
    }

    #[test]
    fn unplaceable_key_leaves_table_untouched() {
        let hashes = FixedHashes(vec![(A, [0, 1]), (B, [0, 1]), (C, [0, 1])]);
        let config = CuckooConfig::default()
            .max_load_factor(1.0)
            .eviction_limit(EvictionLimit::Fixed(4));
        let mut table = CuckooTable::with_config(8, config, hashes);

        table.insert(A, 1).unwrap();
        table.insert(B, 2).unwrap();
        let before = (slot_of(&table, A), slot_of(&table, B));

        // Three keys share the same two slots at every capacity.
        assert_eq!(
            table.insert(C, 3),
            Err(TableError::PlacementFailed { capacity: 2048 })
        );
        assert_eq!(table.capacity(), 8);
        assert_eq!(table.len(), 2);
        assert_eq!((slot_of(&table, A), slot_of(&table, B)), before);
        assert_eq!(table.get(&A), Some(&1));
        assert_eq!(table.get(&B), Some(&2));
        assert_eq!(table.get(&C), None);
        assert_eq!(table.check_invariants(), Ok(()));

        // Overwriting an existing key still works.
        assert_eq!(table.insert(A, 10), Ok(Some(1)));
    }

    #[test]
    fn resize_steps_bound_the_search() {
        let hashes = FixedHashes(vec![(A, [0, 1]), (B, [0, 1]), (C, [0, 1])]);
        let config = CuckooConfig::default()
            .max_load_factor(1.0)
            .max_resize_steps(1);
        let mut table = CuckooTable::with_config(8, config, hashes);
        table.insert(A, ()).unwrap();
        table.insert(B, ()).unwrap();

        assert_eq!(
            table.insert(C, ()),
            Err(TableError::PlacementFailed { capacity: 16 })
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn lookups_probe_at_most_k_slots() {
        let mut table = CuckooTable::with_capacity_and_hashers(0, sip_family(2));
        for k in 0..5000u64 {
            table.insert(k, k).unwrap();
        }

        let hist = table.probe_histogram();
        assert_eq!(hist.len(), 2);
        assert_eq!(hist.iter().sum::<usize>(), table.len());
        // Empty candidates are filled in function order.
        assert!(hist[0] > hist[1], "{hist:?}");
    }

    #[test]
    fn rejects_providers_with_one_function() {
        let result =
            CuckooTable::<u64, u64, _>::try_with_config(8, CuckooConfig::default(), sip_family(1));
        assert_eq!(
            result.err(),
            Some(TableError::Config(ConfigError::HashFunctions {
                engine: "cuckoo",
                required: 2,
                provided: 1,
            }))
        );
    }

    #[test]
    fn rejects_invalid_config() {
        let config = CuckooConfig::default().max_load_factor(0.0);
        let result = CuckooTable::<u64, u64, _>::try_with_config(8, config, sip_family(2));
        assert_eq!(
            result.err(),
            Some(TableError::Config(ConfigError::LoadFactor(0.0)))
        );
    }

    #[test]
    fn capacity_overflow_is_reported() {
        let result = CuckooTable::<u64, u64, _>::try_with_config(
            usize::MAX,
            CuckooConfig::default(),
            sip_family(2),
        );
        assert_eq!(result.err(), Some(TableError::CapacityOverflow));
    }

    #[test]
    fn string_keys_with_default_hashers() {
        let mut table: CuckooTable<String, usize> = CuckooTable::new();
        for i in 0..500 {
            table.insert(format!("key_{i}"), i).unwrap();
        }
        assert_eq!(table.len(), 500);
        for i in 0..500 {
            assert_eq!(table.get(&format!("key_{i}")), Some(&i));
        }
        assert_eq!(table.get(&"missing".to_string()), None);
        assert_eq!(
            table.get_key_value(&"key_7".to_string()),
            Some((&"key_7".to_string(), &7))
        );
    }

    #[test]
    fn iterators_visit_every_entry() {
        let mut table = CuckooTable::with_capacity_and_hashers(0, sip_family(2));
        for k in 0..100u64 {
            table.insert(k, k * 10).unwrap();
        }

        let iter = table.iter();
        assert_eq!(iter.len(), 100);
        let mut pairs: Vec<(u64, u64)> = iter.map(|(k, v)| (*k, *v)).collect();
        pairs.sort_unstable();
        assert_eq!(pairs, (0..100u64).map(|k| (k, k * 10)).collect::<Vec<_>>());

        let mut keys: Vec<u64> = table.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..100u64).collect::<Vec<_>>());

        let total: u64 = table.values().sum();
        assert_eq!(total, (0..100u64).map(|k| k * 10).sum());

        assert_eq!((&table).into_iter().count(), 100);
    }

    #[test]
    fn drain_empties_but_keeps_capacity() {
        let mut table = CuckooTable::with_capacity_and_hashers(0, sip_family(2));
        for k in 0..64u64 {
            table.insert(k, k).unwrap();
        }
        let capacity = table.capacity();

        let mut drained: Vec<(u64, u64)> = table.drain().collect();
        drained.sort_unstable();
        assert_eq!(drained.len(), 64);
        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.get(&3), None);

        for k in 0..64u64 {
            table.insert(k, k).unwrap();
        }
        // Dropping a partly consumed drain still empties the table.
        let mut drain = table.drain();
        assert!(drain.next().is_some());
        drop(drain);
        assert!(table.is_empty());
        assert!(table.iter().next().is_none());
    }

    #[test]
    fn leaked_drain_keeps_table_consistent() {
        let mut table = CuckooTable::with_capacity_and_hashers(0, sip_family(2));
        for k in 0..4u64 {
            table.insert(k, k).unwrap();
        }

        mem::forget(table.drain());
        assert_eq!(table.len(), 4);
        assert_eq!(table.insert(1, 100), Ok(Some(1)));
        assert_eq!(table.iter().count(), 4);
        assert_eq!(table.check_invariants(), Ok(()));

        let mut drain = table.drain();
        let (taken, _) = drain.next().unwrap();
        assert_eq!(drain.len(), 3);
        mem::forget(drain);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(&taken), None);
        assert_eq!(table.insert(taken, 7), Ok(None));
        assert_eq!(table.len(), 4);
        assert_eq!(table.check_invariants(), Ok(()));
    }

    #[test]
    fn failed_reserve_leaves_table_unchanged() {
        let config = CuckooConfig::default().max_load_factor(0.5);
        let mut table = CuckooTable::with_config(8, config, sip_family(2));
        for k in 0..4u64 {
            table.insert(k, k * 10).unwrap();
        }
        let capacity = table.capacity();
        let layout: Vec<Option<u64>> = table.slots.iter().map(|s| s.map(|(k, _)| k)).collect();

        assert_eq!(
            table.reserve(usize::MAX / 8),
            Err(TableError::AllocError {
                slots: usize::MAX / 2 + 1
            })
        );
        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.len(), 4);
        let after: Vec<Option<u64>> = table.slots.iter().map(|s| s.map(|(k, _)| k)).collect();
        assert_eq!(after, layout);
        for k in 0..4u64 {
            assert_eq!(table.get(&k), Some(&(k * 10)));
        }
        assert_eq!(table.check_invariants(), Ok(()));
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut table = CuckooTable::with_capacity_and_hashers(0, sip_family(2));
        for k in 0..40u64 {
            table.insert(k, k).unwrap();
        }
        let capacity = table.capacity();
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.get(&1), None);
        assert_eq!(table.check_invariants(), Ok(()));
    }

    #[test]
    fn reserve_prevents_resizes() {
        let mut table = CuckooTable::with_capacity_and_hashers(0, sip_family(2));
        table.reserve(1000).unwrap();
        let capacity = table.capacity();
        assert!(hash_table::max_len(capacity, table.config().max_load_factor) >= 1000);

        for k in 0..1000u64 {
            table.insert(k, k).unwrap();
        }
        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.reserve(usize::MAX), Err(TableError::CapacityOverflow));
        assert_eq!(table.len(), 1000);
    }

    #[test]
    fn shrink_to_fit_keeps_entries() {
        let mut table = CuckooTable::with_capacity_and_hashers(0, sip_family(2));
        for k in 0..1000u64 {
            table.insert(k, k).unwrap();
        }
        for k in 10..1000u64 {
            table.remove(&k);
        }
        let before = table.capacity();
        table.shrink_to_fit().unwrap();
        assert!(table.capacity() < before);
        assert_eq!(table.len(), 10);
        for k in 0..10u64 {
            assert_eq!(table.get(&k), Some(&k));
        }
        assert_eq!(table.check_invariants(), Ok(()));

        table.clear();
        table.shrink_to_fit().unwrap();
        assert_eq!(table.capacity(), 0);
        table.insert(1, 1).unwrap();
        assert_eq!(table.get(&1), Some(&1));
    }

    #[test]
    fn clone_is_independent() {
        let mut table = CuckooTable::with_capacity_and_hashers(0, sip_family(2));
        for k in 0..50u64 {
            table.insert(k, k).unwrap();
        }
        let mut copy = table.clone();
        copy.insert(0, 100).unwrap();
        copy.remove(&1);

        assert_eq!(table.get(&0), Some(&0));
        assert_eq!(table.get(&1), Some(&1));
        assert_eq!(copy.get(&0), Some(&100));
        assert_eq!(copy.get(&1), None);
    }

    #[test]
    fn debug_formats_as_map() {
        let mut table = CuckooTable::with_capacity_and_hashers(8, scenario_hashes());
        table.insert(A, "a").unwrap();
        assert_eq!(format!("{table:?}"), "{10: \"a\"}");
    }

    #[test]
    fn debug_stats_reflect_occupancy() {
        let config = CuckooConfig::default().max_load_factor(1.0);
        let mut table = CuckooTable::with_config(8, config, scenario_hashes());
        for key in [A, B, C, D] {
            table.insert(key, ()).unwrap();
        }

        let stats = table.debug_stats();
        assert_eq!(stats.populated, 4);
        assert_eq!(stats.capacity, 8);
        assert_eq!(stats.max_populated, 8);
        assert_eq!(stats.load_factor, 0.5);
        // A and B sit in their second candidates.
        assert_eq!(stats.max_probe, 2);
        assert_eq!(table.probe_histogram(), vec![2, 2]);
    }
}
