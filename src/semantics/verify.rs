//! Independent verification of (multiplier, shift) candidates
//!
//! A candidate is accepted only when the oracle proves that no input
//! distinguishes it from real division. A concrete pre-screen over edge
//! cases and seeded random inputs rejects most wrong candidates without a
//! solver call.

use crate::error::{MagicError, Result};
use crate::ir::{Candidate, Counterexample, Divisor};
use crate::semantics::concrete::check_input;
use crate::semantics::formulator::{INPUT, build_counterexample_formula};
use crate::semantics::oracle::{Oracle, SolveOutcome};
use crate::validation::{RandomInputConfig, generate_screening_inputs};
use std::fmt;
use tracing::{debug, warn};

/// Result of verifying one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// No counterexample exists in the whole W-bit domain
    Accepted,
    /// The candidate is provably wrong
    Rejected(Counterexample),
    /// The oracle could not decide; this is never an acceptance
    Inconclusive(String),
}

impl VerificationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VerificationOutcome::Accepted)
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationOutcome::Accepted => write!(f, "accepted"),
            VerificationOutcome::Rejected(cex) => write!(f, "rejected ({})", cex),
            VerificationOutcome::Inconclusive(reason) => write!(f, "inconclusive ({})", reason),
        }
    }
}

/// Configuration for candidate verification
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Screen with concrete inputs before asking the oracle
    pub screen: bool,
    /// Random inputs used by the screen, on top of the edge cases
    pub screen_samples: usize,
    /// Seed for the screening inputs
    pub seed: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            screen: true,
            screen_samples: 32,
            seed: 0x5eed,
        }
    }
}

impl VerifierConfig {
    /// Verification through the oracle only
    pub fn oracle_only() -> Self {
        Self {
            screen: false,
            ..Self::default()
        }
    }

    pub fn with_screen_samples(mut self, samples: usize) -> Self {
        self.screen_samples = samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Checks candidates against an oracle
pub struct Verifier<'o, O: Oracle + ?Sized> {
    oracle: &'o O,
    config: VerifierConfig,
}

impl<'o, O: Oracle + ?Sized> Verifier<'o, O> {
    pub fn new(oracle: &'o O, config: VerifierConfig) -> Self {
        Self { oracle, config }
    }

    /// Verify `candidate` as a replacement for division by `divisor`
    pub fn verify(&self, candidate: Candidate, divisor: Divisor) -> Result<VerificationOutcome> {
        candidate.check_bounds(divisor.width())?;

        if self.config.screen {
            if let Some(cex) = self.screen(candidate, divisor) {
                debug!(%candidate, %cex, "rejected by concrete screen");
                return Ok(VerificationOutcome::Rejected(cex));
            }
        }

        let formula = build_counterexample_formula(divisor, candidate);
        match self.oracle.solve(&formula)? {
            SolveOutcome::Unsatisfiable => {
                debug!(%candidate, "no counterexample exists");
                Ok(VerificationOutcome::Accepted)
            }
            SolveOutcome::Satisfiable(model) => {
                let x = model
                    .get(INPUT)
                    .ok_or_else(|| MagicError::MalformedModel(INPUT.to_string()))?;
                // The oracle's witness must be a real counterexample
                match check_input(x, candidate, divisor) {
                    Some(cex) => {
                        debug!(%candidate, %cex, "oracle found a counterexample");
                        Ok(VerificationOutcome::Rejected(cex))
                    }
                    None => Err(MagicError::SpuriousCounterexample { x }),
                }
            }
            SolveOutcome::Unknown(reason) => {
                warn!(%candidate, %reason, "verification inconclusive");
                Ok(VerificationOutcome::Inconclusive(reason))
            }
        }
    }

    fn screen(&self, candidate: Candidate, divisor: Divisor) -> Option<Counterexample> {
        let config = RandomInputConfig {
            count: self.config.screen_samples,
            seed: self.config.seed,
        };
        generate_screening_inputs(&config, divisor)
            .into_iter()
            .find_map(|x| check_input(x, candidate, divisor))
    }
}

/// Verify with the default configuration
pub fn verify<O: Oracle + ?Sized>(
    oracle: &O,
    candidate: Candidate,
    divisor: Divisor,
) -> Result<VerificationOutcome> {
    Verifier::new(oracle, VerifierConfig::default()).verify(candidate, divisor)
}
