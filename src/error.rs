//! Error types shared across the crate

use crate::semantics::oracle::OracleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MagicError {
    #[error("invalid width {0}: expected 2..=64 bits")]
    InvalidWidth(u32),

    #[error("invalid divisor {divisor} for width {width}: expected 1 < d < 2^{width}")]
    InvalidDivisor { divisor: u64, width: u32 },

    #[error("candidate multiplier={multiplier} shift={shift} is outside the {width}-bit domain")]
    CandidateOutOfRange {
        multiplier: u64,
        shift: u32,
        width: u32,
    },

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("oracle model is missing symbol '{0}'")]
    MalformedModel(String),

    #[error("oracle reported x={x} as a counterexample, but the candidate is correct there")]
    SpuriousCounterexample { x: u64 },
}

pub type Result<T> = std::result::Result<T, MagicError>;
