//! Half-open multiplier ranges and partitioning of the multiplier domain

use crate::ir::types::Width;
use std::fmt;

/// Half-open interval `[start, end)` over the multiplier domain `[0, 2^W)`
///
/// Bounds are `u128` so that `end = 2^64` is representable for 64-bit searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MultiplierRange {
    pub start: u128,
    pub end: u128,
}

impl MultiplierRange {
    pub fn new(start: u128, end: u128) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// The whole domain `[0, 2^W)`
    pub fn full(width: Width) -> Self {
        Self::new(0, width.modulus())
    }

    pub fn len(&self) -> u128 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, value: u128) -> bool {
        self.start <= value && value < self.end
    }
}

impl fmt::Display for MultiplierRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.start, self.end)
    }
}

/// Split `[0, 2^W)` into `part_count` consecutive ranges.
///
/// Every range has size `2^W / part_count` except the last, whose end is
/// pinned to `2^W` so that the remainder of the division is covered. When
/// `part_count > 2^W` all ranges but the last are empty.
pub fn partition_domain(width: Width, part_count: usize) -> Vec<MultiplierRange> {
    let part_count = part_count.max(1);
    let max_value = width.modulus();
    let part_size = max_value / part_count as u128;

    (0..part_count)
        .map(|i| {
            let i = i as u128;
            let start = i * part_size;
            let end = if i + 1 < part_count as u128 {
                (i + 1) * part_size
            } else {
                max_value
            };
            MultiplierRange::new(start, end)
        })
        .collect()
}
