//! Division semantics: formulas, the oracle interface and candidate verification

pub mod concrete;
pub mod formulator;
pub mod oracle;
pub mod smt;
pub mod verify;

// Re-export main functionality
pub use concrete::{computed_quotient, expected_quotient, find_counterexample_exhaustive};
pub use formulator::{build_counterexample_formula, build_formula, build_scaled_formula};
pub use oracle::{Model, Oracle, OracleError, SolveOutcome};
pub use smt::{SolverConfig, Z3Oracle};
pub use verify::{VerificationOutcome, Verifier, VerifierConfig, verify};
