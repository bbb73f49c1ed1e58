//! Core value types: integer width, divisor and (multiplier, shift) candidates

use crate::error::{MagicError, Result};
use std::fmt;

/// Bit width of the simulated unsigned integer domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Width(u32);

impl Width {
    pub const MIN_BITS: u32 = 2;
    pub const MAX_BITS: u32 = 64;

    /// Create a width, rejecting anything outside 2..=64 bits
    pub fn new(bits: u32) -> Result<Self> {
        if !(Self::MIN_BITS..=Self::MAX_BITS).contains(&bits) {
            return Err(MagicError::InvalidWidth(bits));
        }
        Ok(Self(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Width of the intermediate product (2W)
    pub fn double(self) -> u32 {
        self.0 * 2
    }

    /// Exclusive upper bound of the domain, 2^W
    pub fn modulus(self) -> u128 {
        1u128 << self.0
    }

    /// Mask selecting the low W bits
    pub fn mask(self) -> u64 {
        if self.0 == 64 {
            u64::MAX
        } else {
            (1u64 << self.0) - 1
        }
    }

    /// Largest representable value, 2^W - 1
    pub fn max_value(self) -> u64 {
        self.mask()
    }

    /// Exclusive upper bound for shift amounts (2W)
    pub fn shift_limit(self) -> u32 {
        self.double()
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.0)
    }
}

/// A divisor `d` with `1 < d < 2^W`, bundled with its width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Divisor {
    value: u64,
    width: Width,
}

impl Divisor {
    pub fn new(value: u64, width: Width) -> Result<Self> {
        if value <= 1 || u128::from(value) >= width.modulus() {
            return Err(MagicError::InvalidDivisor {
                divisor: value,
                width: width.bits(),
            });
        }
        Ok(Self { value, width })
    }

    /// Validate raw `(divisor, bits)` input as supplied by a caller
    pub fn from_raw(value: u64, bits: u32) -> Result<Self> {
        Self::new(value, Width::new(bits)?)
    }

    pub fn value(self) -> u64 {
        self.value
    }

    pub fn width(self) -> Width {
        self.width
    }
}

impl fmt::Display for Divisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.width)
    }
}

/// A proposed replacement of `x / d` by `(multiplier * x) >> shift`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Candidate {
    pub multiplier: u64,
    pub shift: u32,
}

impl Candidate {
    pub fn new(multiplier: u64, shift: u32) -> Self {
        Self { multiplier, shift }
    }

    /// Check `multiplier < 2^W` and `shift < 2W`
    pub fn check_bounds(&self, width: Width) -> Result<()> {
        if self.multiplier > width.max_value() || self.shift >= width.shift_limit() {
            return Err(MagicError::CandidateOutOfRange {
                multiplier: self.multiplier,
                shift: self.shift,
                width: width.bits(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(x * {:#x}) >> {} [multiplier={}, shift={}]",
            self.multiplier, self.shift, self.multiplier, self.shift
        )
    }
}

/// A concrete input disproving a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counterexample {
    pub x: u64,
    /// `x / d`
    pub expected: u64,
    /// `truncate_W((a * x) >> s)`
    pub computed: u64,
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x = {}: expected {} but computed {}",
            self.x, self.expected, self.computed
        )
    }
}
