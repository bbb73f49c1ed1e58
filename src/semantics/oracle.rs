//! The solving oracle: a narrow interface to an external bit-vector solver

use crate::ir::Formula;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("unknown symbol '{0}' in formula")]
    UnknownSymbol(String),
    #[error("term of {0} bits cannot be lowered")]
    UnsupportedWidth(u32),
    #[error("solver backend error: {0}")]
    Backend(String),
}

/// Symbol assignments from a satisfiable query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    pub values: HashMap<String, u64>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: u64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.values.get(name).copied()
    }
}

/// Decision returned by the oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Satisfiable(Model),
    Unsatisfiable,
    /// Timeout or resource limit; the reason is backend specific
    Unknown(String),
}

/// Abstract solving oracle.
///
/// Implementations must be callable from several worker threads at once;
/// each call is independent.
pub trait Oracle: Send + Sync {
    /// Decide satisfiability of the conjunction of the formula's assertions.
    fn solve(&self, formula: &Formula) -> Result<SolveOutcome, OracleError>;

    /// Short name for logs
    fn name(&self) -> &str {
        "oracle"
    }
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn solve(&self, formula: &Formula) -> Result<SolveOutcome, OracleError> {
        (**self).solve(formula)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
