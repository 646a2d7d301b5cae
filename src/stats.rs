//! Occupancy and probe statistics.
//!
//! Compiled for tests and with the `stats` feature. Printing additionally
//! requires `std`.

/// Debug statistics for table analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugStats {
    /// Number of entries in the table
    pub populated: usize,
    /// Number of slots
    pub capacity: usize,
    /// Entry count at which the next new key resizes
    pub max_populated: usize,
    /// Current load factor (populated / capacity)
    pub load_factor: f64,
    /// Configured maximum load factor
    pub max_load_factor: f64,
    /// Largest number of slots any successful lookup probes
    pub max_probe: usize,
    /// Bytes held by the slot array
    pub total_bytes: usize,
    /// Bytes held by empty slots
    pub wasted_bytes: usize,
}

impl DebugStats {
    pub(crate) fn new<S>(
        populated: usize,
        capacity: usize,
        max_populated: usize,
        max_load_factor: f64,
        max_probe: usize,
    ) -> Self {
        let slot_size = core::mem::size_of::<S>();
        Self {
            populated,
            capacity,
            max_populated,
            load_factor: if capacity == 0 {
                0.0
            } else {
                populated as f64 / capacity as f64
            },
            max_load_factor,
            max_probe,
            total_bytes: capacity * slot_size,
            wasted_bytes: (capacity - populated) * slot_size,
        }
    }

    /// Pretty-prints the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Table Debug Statistics ===");
        println!(
            "Population: {}/{} slots ({:.2}% load, limit {:.2}%)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0,
            self.max_load_factor * 100.0
        );
        println!("Resize at: {} entries", self.max_populated);
        println!("Longest probe: {} slots", self.max_probe);
        println!("Total Allocated: {} bytes", self.total_bytes);
        println!(
            "Memory: {} bytes wasted ({:.02}%)",
            self.wasted_bytes,
            if self.total_bytes == 0 {
                0.0
            } else {
                (self.wasted_bytes as f64 / self.total_bytes as f64) * 100.0
            }
        );
    }
}

/// Prints `hist` as a horizontal bar chart, one row per bin.
#[cfg(feature = "std")]
pub fn print_histogram(title: &str, hist: &[usize]) {
    let max = hist.iter().copied().max().unwrap_or(0);
    if max == 0 {
        println!("{title}: empty");
        return;
    }

    println!("{title} ({} entries):", hist.iter().sum::<usize>());
    for (bin, &count) in hist.iter().enumerate() {
        println!("{bin:>3} | {} ({count})", bar(count, max, 60));
    }
}

/// Renders `count` out of `max` as a bar of at most `width` cells using
/// eighth-block characters.
#[cfg(feature = "std")]
fn bar(count: usize, max: usize, width: usize) -> String {
    const PARTIAL: [char; 7] = ['▏', '▎', '▍', '▌', '▋', '▊', '▉'];

    if count == 0 || max == 0 {
        return String::new();
    }
    let units = (count as u128 * (width * 8) as u128).div_ceil(max as u128) as usize;
    let mut bar = "█".repeat(units / 8);
    if let Some(&partial) = (units % 8).checked_sub(1).and_then(|i| PARTIAL.get(i)) {
        bar.push(partial);
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_accounting_uses_slot_size() {
        let stats = DebugStats::new::<Option<(u64, u64)>>(3, 8, 4, 0.5, 2);
        let slot = core::mem::size_of::<Option<(u64, u64)>>();
        assert_eq!(stats.total_bytes, 8 * slot);
        assert_eq!(stats.wasted_bytes, 5 * slot);
        assert_eq!(stats.load_factor, 0.375);
    }

    #[test]
    fn empty_table_has_zero_load() {
        let stats = DebugStats::new::<u64>(0, 0, 0, 0.9, 0);
        assert_eq!(stats.load_factor, 0.0);
        assert_eq!(stats.total_bytes, 0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn bars_scale_to_the_largest_bin() {
        assert_eq!(bar(0, 10, 4), "");
        assert_eq!(bar(10, 10, 4), "████");
        assert_eq!(bar(5, 10, 4), "██");
        assert_eq!(bar(1, 10, 4), "▌");
    }
}
