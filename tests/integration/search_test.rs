use divmagic::ir::{Candidate, Divisor, Formula, FormulaKind, Width};
use divmagic::search::{
    CancelToken, ParallelConfig, PartitionOutcome, SearchConfig, Verdict, find_magic,
    run_partitioned_search,
};
use divmagic::semantics::concrete::{computed_quotient, expected_quotient};
use divmagic::semantics::{
    Model, Oracle, OracleError, SolveOutcome, VerificationOutcome, Z3Oracle, verify,
};
use std::time::Duration;

fn divisor(value: u64, bits: u32) -> Divisor {
    Divisor::new(value, Width::new(bits).unwrap()).unwrap()
}

fn small_config(workers: usize, per_worker: usize) -> SearchConfig {
    SearchConfig::default().with_parallel(
        ParallelConfig::default()
            .with_workers(workers)
            .with_partitions_per_worker(per_worker),
    )
}

fn holds_for_all_inputs(candidate: Candidate, d: Divisor) -> bool {
    (0..=d.width().max_value())
        .all(|x| expected_quotient(x, d) == computed_quotient(x, candidate, d))
}

#[test]
fn test_divide_by_nine_8bit() {
    let d = divisor(9, 8);
    let report = find_magic(d, &small_config(2, 4), &Z3Oracle::default()).unwrap();

    let solutions = report.verdict.solutions();
    assert!(!solutions.is_empty());
    assert!(solutions.contains(&Candidate::new(57, 9)));
    for candidate in solutions {
        assert!(holds_for_all_inputs(*candidate, d), "{}", candidate);
    }

    let search = report.search.as_ref().unwrap();
    assert_eq!(search.partitions.len(), 8);
    assert!(search.is_complete());
}

#[test]
fn test_every_small_divisor_8bit() {
    let oracle = Z3Oracle::default();
    for value in 2..=16u64 {
        let d = divisor(value, 8);
        let report = find_magic(d, &small_config(2, 2), &oracle).unwrap();

        let exists = (0..256u64)
            .any(|a| (0..16).any(|s| holds_for_all_inputs(Candidate::new(a, s), d)));
        if exists {
            let solutions = report.verdict.solutions();
            assert!(!solutions.is_empty(), "no solution for d = {}", value);
            for candidate in solutions {
                assert!(holds_for_all_inputs(*candidate, d), "d = {}: {}", value, candidate);
            }
        } else {
            // 7, 11 and 14 need a multiplier wider than 8 bits
            assert_eq!(report.verdict, Verdict::NoSolution, "d = {}", value);
        }
    }
}

#[test]
fn test_divide_by_seven_8bit_has_no_solution() {
    let report = find_magic(divisor(7, 8), &small_config(2, 4), &Z3Oracle::default()).unwrap();
    assert_eq!(report.verdict, Verdict::NoSolution);
    assert!(report.verifications.is_empty());
    assert!(report.to_string().contains("No solution found in explored space."));
}

#[test]
fn test_known_magic_verifies_and_identity_does_not() {
    let oracle = Z3Oracle::default();
    let d = divisor(9, 8);

    assert_eq!(
        verify(&oracle, Candidate::new(57, 9), d).unwrap(),
        VerificationOutcome::Accepted
    );
    match verify(&oracle, Candidate::new(1, 0), d).unwrap() {
        VerificationOutcome::Rejected(cex) => {
            assert_eq!(cex.expected, cex.x / 9);
            assert_eq!(cex.computed, cex.x);
            assert_ne!(cex.expected, cex.computed);
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[test]
fn test_wide_known_magic_verifies() {
    let oracle = Z3Oracle::default();
    assert_eq!(
        verify(&oracle, Candidate::new(0xCCCC_CCCD, 35), divisor(10, 32)).unwrap(),
        VerificationOutcome::Accepted
    );
}

/// Times out every search query over the upper half of the domain
struct HalfBlindOracle {
    inner: Z3Oracle,
}

impl Oracle for HalfBlindOracle {
    fn solve(&self, formula: &Formula) -> Result<SolveOutcome, OracleError> {
        match formula.kind {
            FormulaKind::Search { bound: Some(range) } if range.start >= 128 => {
                Ok(SolveOutcome::Unknown("timeout".into()))
            }
            _ => self.inner.solve(formula),
        }
    }
}

#[test]
fn test_unknown_partitions_contribute_nothing() {
    let d = divisor(9, 8);
    let oracle = HalfBlindOracle {
        inner: Z3Oracle::default(),
    };
    let result = run_partitioned_search(
        d,
        &ParallelConfig::default()
            .with_workers(2)
            .with_partitions_per_worker(4),
        &oracle,
        &CancelToken::new(),
    );

    assert_eq!(
        result.distinct_candidates(),
        vec![Candidate::new(57, 9), Candidate::new(114, 10)]
    );
    assert_eq!(result.statistics.partitions_inconclusive, 4);
    assert!(!result.is_complete());
}

/// Never finds anything and never proves anything
struct ShruggingOracle;

impl Oracle for ShruggingOracle {
    fn solve(&self, _formula: &Formula) -> Result<SolveOutcome, OracleError> {
        Ok(SolveOutcome::Unknown("resource limit".into()))
    }
}

#[test]
fn test_all_unknown_is_inconclusive_not_no_solution() {
    let report = find_magic(divisor(9, 8), &small_config(1, 4), &ShruggingOracle).unwrap();
    match report.verdict {
        Verdict::Inconclusive { ranges, .. } => assert_eq!(ranges.len(), 4),
        other => panic!("expected inconclusive verdict, got {:?}", other),
    }
}

/// Claims a wrong candidate for every partition, then answers honestly
struct LyingSearchOracle {
    inner: Z3Oracle,
}

impl Oracle for LyingSearchOracle {
    fn solve(&self, formula: &Formula) -> Result<SolveOutcome, OracleError> {
        match formula.kind {
            FormulaKind::Search { bound: Some(range) } => Ok(SolveOutcome::Satisfiable(
                Model::new()
                    .with("a", range.start as u64)
                    .with("s", 0),
            )),
            _ => self.inner.solve(formula),
        }
    }
}

#[test]
fn test_wrong_candidates_are_filtered_by_verification() {
    let report = find_magic(
        divisor(9, 8),
        &small_config(1, 4),
        &LyingSearchOracle {
            inner: Z3Oracle::default(),
        },
    )
    .unwrap();

    assert_eq!(report.verdict, Verdict::NoSolution);
    assert_eq!(report.rejected().count(), 4);
}

/// Sleeps on every search query so that the deadline expires mid-search
struct SlowOracle;

impl Oracle for SlowOracle {
    fn solve(&self, _formula: &Formula) -> Result<SolveOutcome, OracleError> {
        std::thread::sleep(Duration::from_millis(50));
        Ok(SolveOutcome::Unsatisfiable)
    }
}

#[test]
fn test_deadline_cancels_remaining_partitions() {
    let config = ParallelConfig::default()
        .with_workers(1)
        .with_partitions_per_worker(64)
        .with_timeout(Duration::from_millis(150));
    let result = run_partitioned_search(divisor(9, 8), &config, &SlowOracle, &CancelToken::new());

    // Every partition is still accounted for
    assert_eq!(result.partitions.len(), 64);
    let cancelled = result
        .partitions
        .iter()
        .filter(|p| p.outcome == PartitionOutcome::Cancelled)
        .count();
    assert!(cancelled > 0);
    assert_eq!(
        result.statistics.partitions_cancelled + result.statistics.partitions_no_solution,
        64
    );
}
