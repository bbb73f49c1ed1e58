//! Search followed by verification of every candidate

use crate::error::Result;
use crate::ir::{Candidate, Divisor};
use crate::search::config::SearchConfig;
use crate::search::parallel::{CancelToken, ParallelConfig, run_partitioned_search};
use crate::search::result::{MagicReport, Verdict};
use crate::search::scaled::{ScaledOutcome, ScaledSearch};
use crate::semantics::oracle::Oracle;
use crate::semantics::smt::Z3Oracle;
use crate::semantics::verify::{VerificationOutcome, Verifier};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Run the partitioned search alone and return the raw candidate set.
///
/// Partitions that are unsatisfiable, inconclusive or failed contribute
/// nothing. Candidates are not verified.
pub fn search<O: Oracle + ?Sized>(
    divisor: Divisor,
    worker_count: Option<usize>,
    oracle: &O,
) -> BTreeSet<Candidate> {
    let config = ParallelConfig::default().with_workers_option(worker_count);
    run_partitioned_search(divisor, &config, oracle, &CancelToken::new())
        .candidates
        .into_iter()
        .collect()
}

/// Find verified multiply-shift replacements for division by `divisor`.
///
/// The same oracle answers search and verification queries.
pub fn find_magic<O: Oracle + ?Sized>(
    divisor: Divisor,
    config: &SearchConfig,
    oracle: &O,
) -> Result<MagicReport> {
    find_magic_with_cancel(divisor, config, oracle, &CancelToken::new())
}

/// `find_magic` with an external cancellation token
pub fn find_magic_with_cancel<O: Oracle + ?Sized>(
    divisor: Divisor,
    config: &SearchConfig,
    oracle: &O,
    cancel: &CancelToken,
) -> Result<MagicReport> {
    let verifier = Verifier::new(oracle, config.verifier.clone());

    let fast_path = if config.fast_path {
        let outcome = match ScaledSearch::new(config.scale).run(divisor, oracle, &verifier) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "fast path failed");
                ScaledOutcome::Failed(e.to_string())
            }
        };
        if let ScaledOutcome::Verified(candidate) = outcome {
            info!(%candidate, "fast path succeeded");
            return Ok(MagicReport {
                divisor,
                verdict: Verdict::Solutions(vec![candidate]),
                search: None,
                fast_path: Some(outcome),
                verifications: vec![(candidate, VerificationOutcome::Accepted)],
            });
        }
        info!(%outcome, "fast path did not produce a solution, running full search");
        Some(outcome)
    } else {
        None
    };

    let search = run_partitioned_search(divisor, &config.parallel, oracle, cancel);

    let mut accepted = Vec::new();
    let mut unverified = Vec::new();
    let mut verifications = Vec::new();
    for candidate in search.distinct_candidates() {
        let outcome = match verifier.verify(candidate, divisor) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%candidate, error = %e, "verification failed");
                VerificationOutcome::Inconclusive(e.to_string())
            }
        };
        match &outcome {
            VerificationOutcome::Accepted => accepted.push(candidate),
            VerificationOutcome::Rejected(cex) => {
                warn!(%candidate, %cex, "search returned a wrong candidate");
            }
            VerificationOutcome::Inconclusive(_) => unverified.push(candidate),
        }
        verifications.push((candidate, outcome));
    }

    let verdict = if !accepted.is_empty() {
        Verdict::Solutions(accepted)
    } else if !search.is_complete() || !unverified.is_empty() {
        Verdict::Inconclusive {
            ranges: search.unresolved_partitions().map(|p| p.range).collect(),
            unverified,
        }
    } else {
        Verdict::NoSolution
    };

    info!(
        %divisor,
        solutions = verdict.solutions().len(),
        "search and verification finished"
    );

    Ok(MagicReport {
        divisor,
        verdict,
        search: Some(search),
        fast_path,
        verifications,
    })
}

/// `find_magic` with a Z3 oracle built from `config.solver`
pub fn find_magic_z3(divisor: Divisor, config: &SearchConfig) -> Result<MagicReport> {
    let oracle = Z3Oracle::new(config.solver.clone());
    find_magic(divisor, config, &oracle)
}
