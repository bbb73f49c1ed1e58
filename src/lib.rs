//! divmagic - multiply-shift replacements for unsigned division by a constant
//!
//! For a divisor `d` and width `W`, finds `(a, s)` such that
//! `x / d == truncate_W((a * x) >> s)` for every W-bit `x`, by splitting the
//! multiplier domain into partitions, querying an SMT oracle per partition
//! in parallel, and re-verifying every candidate before reporting it.

pub mod error;
pub mod ir;
pub mod search;
pub mod semantics;
pub mod validation;

pub use error::{MagicError, Result};
pub use ir::{Candidate, Counterexample, Divisor, MultiplierRange, Width};
pub use search::{MagicReport, SearchConfig, Verdict, find_magic, find_magic_z3};
pub use semantics::{Oracle, SolverConfig, VerificationOutcome, Verifier, Z3Oracle, verify};
