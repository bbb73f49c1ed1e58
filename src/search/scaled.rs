//! Shift-zero scaled variant
//!
//! Asks the oracle for a multiplier `m` with `(k * d) * m == k` in W-bit
//! wrapping arithmetic, for a fixed scale constant `k`, and treats
//! `(m, shift 0)` as a candidate. This is a cheap first attempt only: the
//! result always goes through the verifier, and a shift of zero cannot
//! reproduce truncating division for any `d > 1`, so in practice the
//! verifier rejects it and the general search takes over.

use crate::error::{MagicError, Result};
use crate::ir::{Candidate, Counterexample, Divisor};
use crate::semantics::formulator::{SCALED_MULTIPLIER, build_scaled_formula};
use crate::semantics::oracle::{Oracle, SolveOutcome};
use crate::semantics::verify::{VerificationOutcome, Verifier};
use std::fmt;
use tracing::{debug, info};

/// Default scale constant
pub const DEFAULT_SCALE: u64 = 0x1234567;

/// Outcome of one scaled attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaledOutcome {
    /// The oracle's multiplier passed verification
    Verified(Candidate),
    /// The oracle's multiplier is not a valid division replacement
    Rejected {
        candidate: Candidate,
        counterexample: Counterexample,
    },
    /// No `m` satisfies the scaled equation
    NoSolution,
    /// The oracle or the verifier could not decide
    Inconclusive(String),
    /// The attempt itself errored; the general search is unaffected
    Failed(String),
}

impl fmt::Display for ScaledOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaledOutcome::Verified(c) => write!(f, "verified {}", c),
            ScaledOutcome::Rejected {
                candidate,
                counterexample,
            } => write!(f, "rejected {} ({})", candidate, counterexample),
            ScaledOutcome::NoSolution => write!(f, "no solution"),
            ScaledOutcome::Inconclusive(reason) => write!(f, "inconclusive ({})", reason),
            ScaledOutcome::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledSearch {
    pub scale: u64,
}

impl Default for ScaledSearch {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
        }
    }
}

impl ScaledSearch {
    pub fn new(scale: u64) -> Self {
        Self { scale }
    }

    /// Run one scaled attempt for `divisor`.
    ///
    /// Oracle errors and malformed models are returned as errors; every
    /// other result is a `ScaledOutcome`.
    pub fn run<O, V>(
        &self,
        divisor: Divisor,
        oracle: &O,
        verifier: &Verifier<'_, V>,
    ) -> Result<ScaledOutcome>
    where
        O: Oracle + ?Sized,
        V: Oracle + ?Sized,
    {
        let formula = build_scaled_formula(divisor, self.scale);
        let model = match oracle.solve(&formula)? {
            SolveOutcome::Satisfiable(model) => model,
            SolveOutcome::Unsatisfiable => {
                debug!(scale = self.scale, "scaled equation has no solution");
                return Ok(ScaledOutcome::NoSolution);
            }
            SolveOutcome::Unknown(reason) => return Ok(ScaledOutcome::Inconclusive(reason)),
        };

        let multiplier = model
            .get(SCALED_MULTIPLIER)
            .ok_or_else(|| MagicError::MalformedModel(SCALED_MULTIPLIER.to_string()))?;
        let candidate = Candidate::new(multiplier, 0);

        let outcome = match verifier.verify(candidate, divisor)? {
            VerificationOutcome::Accepted => ScaledOutcome::Verified(candidate),
            VerificationOutcome::Rejected(counterexample) => ScaledOutcome::Rejected {
                candidate,
                counterexample,
            },
            VerificationOutcome::Inconclusive(reason) => ScaledOutcome::Inconclusive(reason),
        };
        info!(%divisor, %outcome, "scaled attempt finished");
        Ok(outcome)
    }
}
