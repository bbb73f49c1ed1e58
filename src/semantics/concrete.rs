//! Concrete fixed-width evaluation of division and its multiply-shift replacement
//!
//! All intermediate arithmetic is pinned to `u128`, which holds the full
//! `2W`-bit product for every supported width (W <= 64).

use crate::ir::{Candidate, Counterexample, Divisor};

/// The largest width `find_counterexample_exhaustive` accepts
pub const EXHAUSTIVE_MAX_BITS: u32 = 24;

/// `x / d`
pub fn expected_quotient(x: u64, divisor: Divisor) -> u64 {
    x / divisor.value()
}

/// `truncate_W((zext(a) * zext(x)) >> zext(s))` in 2W-bit precision
pub fn computed_quotient(x: u64, candidate: Candidate, divisor: Divisor) -> u64 {
    let width = divisor.width();
    let product = u128::from(candidate.multiplier) * u128::from(x);
    let shifted = if candidate.shift >= 128 {
        0
    } else {
        product >> candidate.shift
    };
    (shifted as u64) & width.mask()
}

/// Compare both sides at a single input. Returns the counterexample on mismatch.
pub fn check_input(x: u64, candidate: Candidate, divisor: Divisor) -> Option<Counterexample> {
    let x = x & divisor.width().mask();
    let expected = expected_quotient(x, divisor);
    let computed = computed_quotient(x, candidate, divisor);
    if expected != computed {
        Some(Counterexample {
            x,
            expected,
            computed,
        })
    } else {
        None
    }
}

/// Check every input in `[0, 2^W)`, returning the smallest counterexample.
///
/// Returns `None` without checking when the width exceeds
/// `EXHAUSTIVE_MAX_BITS`; use `is_exhaustive_feasible` first.
pub fn find_counterexample_exhaustive(
    candidate: Candidate,
    divisor: Divisor,
) -> Option<Counterexample> {
    if !is_exhaustive_feasible(divisor) {
        return None;
    }
    (0..=divisor.width().max_value()).find_map(|x| check_input(x, candidate, divisor))
}

pub fn is_exhaustive_feasible(divisor: Divisor) -> bool {
    divisor.width().bits() <= EXHAUSTIVE_MAX_BITS
}
