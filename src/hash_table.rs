//! The map contract shared by both engines, and the storage helpers they
//! build on.

use alloc::vec::Vec;

use crate::error::TableError;

/// Capacity a table grows to from zero slots.
pub(crate) const MIN_CAPACITY: usize = 8;

/// The key/value map contract both engines implement.
///
/// A caller written against `HashTable` can switch between
/// [`CuckooTable`](crate::CuckooTable) and [`RobinTable`](crate::RobinTable)
/// without observing any difference except capacity and timing.
///
/// # Examples
///
/// ```rust
/// use skmap::CuckooTable;
/// use skmap::HashTable;
/// use skmap::RobinTable;
///
/// fn fill<T: HashTable<u64, &'static str>>(table: &mut T) {
///     table.insert(1, "one").unwrap();
///     table.insert(2, "two").unwrap();
///     assert_eq!(table.insert(1, "uno").unwrap(), Some("one"));
/// }
///
/// let mut cuckoo = CuckooTable::new();
/// let mut robin = RobinTable::new();
/// fill(&mut cuckoo);
/// fill(&mut robin);
///
/// assert_eq!(cuckoo.get(&1), robin.get(&1));
/// assert_eq!(cuckoo.remove(&2), Some("two"));
/// assert_eq!(robin.remove(&2), Some("two"));
/// assert_eq!(cuckoo.len(), robin.len());
/// ```
pub trait HashTable<K, V> {
    /// Inserts `value` under `key`, returning the value it replaced.
    ///
    /// May relocate other entries and may resize the table. On error the
    /// table is unchanged and `value` is dropped.
    fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TableError>;

    /// Returns the value stored under `key`. Never mutates the table.
    fn get(&self, key: &K) -> Option<&V>;

    /// Returns a mutable reference to the value stored under `key`.
    fn get_mut(&mut self, key: &K) -> Option<&mut V>;

    /// Removes `key` and returns its value.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Number of entries.
    fn len(&self) -> usize;

    /// Number of slots.
    fn capacity(&self) -> usize;

    /// Returns `true` if the table holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `key` is present.
    fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }
}

/// Rounds a requested slot count up to a power of two. Zero stays zero.
pub(crate) fn capacity_for(requested: usize) -> Result<usize, TableError> {
    if requested == 0 {
        return Ok(0);
    }
    requested
        .checked_next_power_of_two()
        .ok_or(TableError::CapacityOverflow)
}

/// Next capacity after `current` under `growth_factor`.
pub(crate) fn grown_capacity(current: usize, growth_factor: usize) -> Result<usize, TableError> {
    if current == 0 {
        return Ok(MIN_CAPACITY);
    }
    current
        .checked_mul(growth_factor)
        .and_then(usize::checked_next_power_of_two)
        .ok_or(TableError::CapacityOverflow)
}

/// Smallest capacity reachable from `current` by growth steps whose entry
/// limit admits `required` entries.
pub(crate) fn capacity_to_hold(
    current: usize,
    required: usize,
    growth_factor: usize,
    max_load_factor: f64,
) -> Result<usize, TableError> {
    let mut capacity = grown_capacity(current, growth_factor)?;
    while max_len(capacity, max_load_factor) < required {
        capacity = grown_capacity(capacity, growth_factor)?;
    }
    Ok(capacity)
}

/// Smallest power-of-two capacity whose entry limit admits `required`.
pub(crate) fn min_capacity_for(required: usize, max_load_factor: f64) -> Result<usize, TableError> {
    if required == 0 {
        return Ok(0);
    }
    let mut capacity = MIN_CAPACITY;
    while max_len(capacity, max_load_factor) < required {
        capacity = capacity.checked_mul(2).ok_or(TableError::CapacityOverflow)?;
    }
    Ok(capacity)
}

/// Largest entry count `capacity` slots may hold under `max_load_factor`.
#[inline]
pub(crate) fn max_len(capacity: usize, max_load_factor: f64) -> usize {
    ((capacity as f64) * max_load_factor) as usize
}

/// Allocates `capacity` empty slots, reporting allocator failure instead of
/// aborting.
pub(crate) fn alloc_slots<T>(capacity: usize) -> Result<Vec<Option<T>>, TableError> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| TableError::AllocError { slots: capacity })?;
    slots.resize_with(capacity, || None);
    Ok(slots)
}
