//! Value types and the solver-agnostic formula representation

pub mod formula;
pub mod range;
pub mod types;

// Re-export commonly used types
pub use formula::{Assignment, BoolTerm, BvTerm, Formula, FormulaKind, Symbol};
pub use range::{MultiplierRange, partition_domain};
pub use types::{Candidate, Counterexample, Divisor, Width};
