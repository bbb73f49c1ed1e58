//! Parallel search coordinator that manages worker threads.

use crate::ir::{Candidate, Divisor, MultiplierRange, partition_domain};
use crate::search::parallel::channel::{
    CancelToken, CoordinatorChannels, PartitionJob, WorkerChannels, WorkerMessage,
    create_channels,
};
use crate::search::parallel::config::ParallelConfig;
use crate::search::result::{PartitionOutcome, PartitionReport, SearchResult, SearchStatistics};
use crate::semantics::formulator::{MULTIPLIER, SHIFT, build_formula};
use crate::semantics::oracle::{Model, Oracle, SolveOutcome};
use crossbeam_channel::RecvTimeoutError;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Search the whole multiplier domain for `divisor`, one oracle query per
/// partition.
///
/// Blocks until every worker has exited. Every partition appears exactly
/// once in the result; partition-level failures never abort the search.
pub fn run_partitioned_search<O: Oracle + ?Sized>(
    divisor: Divisor,
    config: &ParallelConfig,
    oracle: &O,
    cancel: &CancelToken,
) -> SearchResult {
    let start_time = Instant::now();
    let num_workers = config.num_workers.max(1);
    let ranges = partition_domain(divisor.width(), config.part_count());

    info!(
        divisor = divisor.value(),
        width = divisor.width().bits(),
        workers = num_workers,
        partitions = ranges.len(),
        oracle = oracle.name(),
        "starting partitioned search"
    );

    let jobs = ranges
        .iter()
        .enumerate()
        .map(|(index, &range)| PartitionJob { index, range })
        .collect();
    let (coordinator_channels, worker_channels) =
        create_channels(jobs, num_workers, cancel.clone());

    let collected = std::thread::scope(|scope| {
        let handles: Vec<_> = worker_channels
            .into_iter()
            .enumerate()
            .map(|(worker_id, channels)| {
                scope.spawn(move || run_worker(worker_id, divisor, oracle, channels))
            })
            .collect();

        let collected = run_coordinator(coordinator_channels, ranges.len(), config, start_time);

        // Wait for all workers to finish
        for (worker_id, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() {
                warn!(worker_id, "worker panicked");
            }
        }
        collected
    });

    let mut statistics = SearchStatistics {
        num_workers,
        partitions_total: ranges.len() as u64,
        oracle_calls: collected.oracle_calls,
        oracle_time: collected.oracle_time,
        ..Default::default()
    };

    let mut candidates = Vec::new();
    let mut partitions = Vec::with_capacity(ranges.len());
    for (index, (range, outcome)) in ranges.into_iter().zip(collected.outcomes).enumerate() {
        let outcome = outcome.unwrap_or_else(|| {
            PartitionOutcome::Failed("worker exited before reporting".to_string())
        });
        if let PartitionOutcome::Found(candidate) = outcome {
            candidates.push(candidate);
        }
        let report = PartitionReport {
            index,
            range,
            outcome,
        };
        statistics.record(&report);
        partitions.push(report);
    }
    statistics.elapsed_time = start_time.elapsed();

    info!(
        found = statistics.partitions_found,
        unresolved = statistics.partitions_unresolved(),
        elapsed = ?statistics.elapsed_time,
        "partitioned search finished"
    );

    SearchResult {
        divisor,
        candidates,
        partitions,
        statistics,
    }
}

struct Collected {
    outcomes: Vec<Option<PartitionOutcome>>,
    oracle_calls: u64,
    oracle_time: Duration,
}

/// Coordinator loop that receives messages from workers until every
/// partition is reported or all workers are gone.
fn run_coordinator(
    channels: CoordinatorChannels,
    part_count: usize,
    config: &ParallelConfig,
    start_time: Instant,
) -> Collected {
    let mut collected = Collected {
        outcomes: vec![None; part_count],
        oracle_calls: 0,
        oracle_time: Duration::ZERO,
    };
    let mut reported = 0;

    // Calculate timeout
    let deadline = config.timeout.map(|t| start_time + t);

    while reported < part_count {
        if let Some(d) = deadline {
            if Instant::now() >= d && !channels.cancel.is_cancelled() {
                info!("search deadline reached, cancelling undispatched partitions");
                channels.cancel.cancel();
            }
        }

        // Receive with timeout to allow periodic deadline checks
        match channels.from_workers.recv_timeout(Duration::from_millis(100)) {
            Ok(WorkerMessage::PartitionDone {
                worker_id,
                index,
                outcome,
                elapsed,
                oracle_called,
            }) => {
                trace!(worker_id, index, %outcome, ?elapsed, "partition settled");
                if oracle_called {
                    collected.oracle_calls += 1;
                    collected.oracle_time += elapsed;
                }
                match collected.outcomes.get_mut(index) {
                    Some(slot) if slot.is_none() => {
                        *slot = Some(outcome);
                        reported += 1;
                    }
                    Some(_) => warn!(index, "partition reported twice, keeping first"),
                    None => warn!(index, "report for unknown partition"),
                }
            }
            Ok(WorkerMessage::Finished {
                worker_id,
                partitions_processed,
            }) => {
                debug!(worker_id, partitions_processed, "worker finished");
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // All senders dropped, we're done
                break;
            }
        }
    }

    collected
}

/// Worker loop: take partitions from the shared queue until it is drained.
fn run_worker<O: Oracle + ?Sized>(
    worker_id: usize,
    divisor: Divisor,
    oracle: &O,
    channels: WorkerChannels,
) {
    let mut partitions_processed = 0;

    for job in channels.jobs.iter() {
        let started = Instant::now();
        let (outcome, oracle_called) = if channels.cancel.is_cancelled() {
            (PartitionOutcome::Cancelled, false)
        } else if job.range.is_empty() {
            (PartitionOutcome::NoSolution, false)
        } else {
            (solve_partition(divisor, job.range, oracle), true)
        };
        partitions_processed += 1;

        let message = WorkerMessage::PartitionDone {
            worker_id,
            index: job.index,
            outcome,
            elapsed: started.elapsed(),
            oracle_called,
        };
        if channels.to_coordinator.send(message).is_err() {
            break;
        }
    }

    let _ = channels.to_coordinator.send(WorkerMessage::Finished {
        worker_id,
        partitions_processed,
    });
}

/// Ask the oracle for a candidate with its multiplier inside `range`.
pub fn solve_partition<O: Oracle + ?Sized>(
    divisor: Divisor,
    range: MultiplierRange,
    oracle: &O,
) -> PartitionOutcome {
    let formula = build_formula(divisor, Some(range));
    match oracle.solve(&formula) {
        Ok(SolveOutcome::Satisfiable(model)) => match candidate_from_model(&model, divisor, range) {
            Ok(candidate) => {
                debug!(%range, %candidate, "partition yielded a candidate");
                PartitionOutcome::Found(candidate)
            }
            Err(message) => {
                warn!(%range, %message, "unusable model");
                PartitionOutcome::Failed(message)
            }
        },
        Ok(SolveOutcome::Unsatisfiable) => PartitionOutcome::NoSolution,
        Ok(SolveOutcome::Unknown(reason)) => {
            warn!(%range, %reason, "partition inconclusive");
            PartitionOutcome::Inconclusive(reason)
        }
        Err(e) => {
            warn!(%range, error = %e, "oracle error");
            PartitionOutcome::Failed(e.to_string())
        }
    }
}

fn candidate_from_model(
    model: &Model,
    divisor: Divisor,
    range: MultiplierRange,
) -> Result<Candidate, String> {
    let multiplier = model
        .get(MULTIPLIER)
        .ok_or_else(|| format!("model has no value for '{}'", MULTIPLIER))?;
    let shift = model
        .get(SHIFT)
        .ok_or_else(|| format!("model has no value for '{}'", SHIFT))?;
    let shift = u32::try_from(shift).map_err(|_| format!("shift {} out of range", shift))?;

    let candidate = Candidate::new(multiplier, shift);
    if !range.contains(u128::from(multiplier)) {
        return Err(format!("multiplier {} outside partition {}", multiplier, range));
    }
    candidate
        .check_bounds(divisor.width())
        .map_err(|e| e.to_string())?;
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Formula, FormulaKind, Width};
    use crate::semantics::concrete::find_counterexample_exhaustive;
    use crate::semantics::oracle::OracleError;
    use crate::semantics::smt::Z3Oracle;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn nine_8bit() -> Divisor {
        Divisor::new(9, Width::new(8).unwrap()).unwrap()
    }

    /// Answers bounded search queries by brute force over the partition
    /// (8-bit only), or with a fixed response for selected partitions.
    struct BruteForceOracle {
        divisor: Divisor,
        unknown_from: Option<u128>,
        calls: AtomicUsize,
    }

    impl BruteForceOracle {
        fn new(divisor: Divisor) -> Self {
            Self {
                divisor,
                unknown_from: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Oracle for BruteForceOracle {
        fn solve(&self, formula: &Formula) -> Result<SolveOutcome, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let range = match formula.kind {
                FormulaKind::Search { bound: Some(range) } => range,
                _ => return Err(OracleError::Backend("unexpected formula".into())),
            };
            if self.unknown_from.is_some_and(|start| range.start >= start) {
                return Ok(SolveOutcome::Unknown("timeout".into()));
            }
            for a in range.start..range.end {
                for s in 0..self.divisor.width().shift_limit() {
                    let candidate = Candidate::new(a as u64, s);
                    if find_counterexample_exhaustive(candidate, self.divisor).is_none() {
                        return Ok(SolveOutcome::Satisfiable(
                            Model::new().with(MULTIPLIER, a as u64).with(SHIFT, u64::from(s)),
                        ));
                    }
                }
            }
            Ok(SolveOutcome::Unsatisfiable)
        }
    }

    struct FailingOracle;

    impl Oracle for FailingOracle {
        fn solve(&self, _formula: &Formula) -> Result<SolveOutcome, OracleError> {
            Err(OracleError::Backend("solver crashed".into()))
        }
    }

    fn small_config(workers: usize, per_worker: usize) -> ParallelConfig {
        ParallelConfig::default()
            .with_workers(workers)
            .with_partitions_per_worker(per_worker)
    }

    #[test]
    fn test_finds_all_8bit_solutions() {
        let divisor = nine_8bit();
        let oracle = BruteForceOracle::new(divisor);
        let result =
            run_partitioned_search(divisor, &small_config(2, 4), &oracle, &CancelToken::new());

        assert_eq!(result.partitions.len(), 8);
        assert!(result.is_complete());
        assert_eq!(
            result.distinct_candidates(),
            vec![
                Candidate::new(57, 9),
                Candidate::new(114, 10),
                Candidate::new(228, 11)
            ]
        );
        assert_eq!(result.statistics.partitions_found, 3);
        assert_eq!(result.statistics.partitions_no_solution, 5);
        assert_eq!(result.statistics.oracle_calls, 8);
    }

    #[test]
    fn test_reports_are_in_partition_order() {
        let divisor = nine_8bit();
        let oracle = BruteForceOracle::new(divisor);
        let result =
            run_partitioned_search(divisor, &small_config(3, 3), &oracle, &CancelToken::new());

        for (i, report) in result.partitions.iter().enumerate() {
            assert_eq!(report.index, i);
        }
        assert_eq!(result.partitions.last().unwrap().range.end, 256);
    }

    #[test]
    fn test_empty_partitions_skip_the_oracle() {
        let divisor = Divisor::new(3, Width::new(4).unwrap()).unwrap();
        let oracle = BruteForceOracle::new(divisor);
        let result =
            run_partitioned_search(divisor, &small_config(2, 16), &oracle, &CancelToken::new());

        // 32 partitions over 16 values: part_size = 0, only the last is non-empty
        assert_eq!(result.partitions.len(), 32);
        assert_eq!(result.statistics.partitions_empty, 31);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.statistics.oracle_calls, 1);
    }

    #[test]
    fn test_inconclusive_partitions_do_not_abort() {
        let divisor = nine_8bit();
        let mut oracle = BruteForceOracle::new(divisor);
        oracle.unknown_from = Some(128);
        let result =
            run_partitioned_search(divisor, &small_config(2, 4), &oracle, &CancelToken::new());

        assert_eq!(
            result.distinct_candidates(),
            vec![Candidate::new(57, 9), Candidate::new(114, 10)]
        );
        let unresolved: Vec<_> = result
            .unresolved_partitions()
            .map(|p| p.range.start)
            .collect();
        assert_eq!(unresolved, vec![128, 160, 192, 224]);
        assert_eq!(result.statistics.partitions_inconclusive, 4);
    }

    #[test]
    fn test_oracle_errors_are_local_failures() {
        let result = run_partitioned_search(
            nine_8bit(),
            &small_config(2, 2),
            &FailingOracle,
            &CancelToken::new(),
        );
        assert_eq!(result.partitions.len(), 4);
        assert!(result.candidates.is_empty());
        assert_eq!(result.statistics.partitions_failed, 4);
        assert!(
            result
                .partitions
                .iter()
                .all(|p| matches!(&p.outcome, PartitionOutcome::Failed(m) if m.contains("crashed")))
        );
    }

    #[test]
    fn test_pre_cancelled_search_accounts_for_every_partition() {
        let divisor = nine_8bit();
        let oracle = BruteForceOracle::new(divisor);
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = run_partitioned_search(divisor, &small_config(2, 4), &oracle, &cancel);
        assert_eq!(result.partitions.len(), 8);
        assert_eq!(result.statistics.partitions_cancelled, 8);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_model_outside_partition_is_rejected() {
        let divisor = nine_8bit();
        let model = Model::new().with(MULTIPLIER, 57).with(SHIFT, 9);
        assert!(candidate_from_model(&model, divisor, MultiplierRange::new(0, 32)).is_err());
        assert_eq!(
            candidate_from_model(&model, divisor, MultiplierRange::new(32, 64)),
            Ok(Candidate::new(57, 9))
        );
        let missing = Model::new().with(MULTIPLIER, 57);
        assert!(candidate_from_model(&missing, divisor, MultiplierRange::new(32, 64)).is_err());
    }

    #[test]
    fn test_z3_partitioned_search_8bit() {
        let divisor = nine_8bit();
        let oracle = Z3Oracle::default();
        let result =
            run_partitioned_search(divisor, &small_config(2, 4), &oracle, &CancelToken::new());

        assert!(result.is_complete());
        assert_eq!(result.distinct_candidates().len(), 3);
        for candidate in result.distinct_candidates() {
            assert_eq!(find_counterexample_exhaustive(candidate, divisor), None);
        }
    }
}
