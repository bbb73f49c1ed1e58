//! Configuration for a full search-and-verify run

use crate::search::parallel::ParallelConfig;
use crate::search::scaled::DEFAULT_SCALE;
use crate::semantics::smt::SolverConfig;
use crate::semantics::verify::VerifierConfig;
use std::time::Duration;

/// Main search configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Per-query oracle settings
    pub solver: SolverConfig,
    /// Worker pool and partitioning
    pub parallel: ParallelConfig,
    /// Candidate verification
    pub verifier: VerifierConfig,
    /// Try the shift-zero scaled variant before the partitioned search
    pub fast_path: bool,
    /// Scale constant for the fast path
    pub scale: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            parallel: ParallelConfig::default(),
            verifier: VerifierConfig::default(),
            fast_path: false,
            scale: DEFAULT_SCALE,
        }
    }
}

impl SearchConfig {
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_verifier(mut self, verifier: VerifierConfig) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.parallel = self.parallel.with_workers(num_workers);
        self
    }

    /// Per-query oracle timeout
    pub fn with_solver_timeout(mut self, timeout: Duration) -> Self {
        self.solver = SolverConfig::with_timeout(timeout);
        self
    }

    pub fn with_fast_path(mut self, enabled: bool) -> Self {
        self.fast_path = enabled;
        self
    }

    pub fn with_scale(mut self, scale: u64) -> Self {
        self.scale = scale;
        self
    }
}
