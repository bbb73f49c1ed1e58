//! Search result types and statistics

use crate::ir::{Candidate, Divisor, MultiplierRange};
use crate::search::scaled::ScaledOutcome;
use crate::semantics::VerificationOutcome;
use std::fmt;
use std::time::Duration;

/// How a single partition of the multiplier domain was settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionOutcome {
    /// The oracle returned a candidate inside the partition
    Found(Candidate),
    /// No candidate exists inside the partition (or the partition is empty)
    NoSolution,
    /// The oracle gave up (timeout or resource limit)
    Inconclusive(String),
    /// The oracle call failed or the worker never reported back
    Failed(String),
    /// The search was cancelled before this partition was dispatched
    Cancelled,
}

impl PartitionOutcome {
    /// Whether the partition was fully explored with a definite answer
    pub fn is_settled(&self) -> bool {
        matches!(self, PartitionOutcome::Found(_) | PartitionOutcome::NoSolution)
    }
}

impl fmt::Display for PartitionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionOutcome::Found(c) => write!(f, "found {}", c),
            PartitionOutcome::NoSolution => write!(f, "no solution"),
            PartitionOutcome::Inconclusive(reason) => write!(f, "inconclusive ({})", reason),
            PartitionOutcome::Failed(message) => write!(f, "failed ({})", message),
            PartitionOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Final accounting for one partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionReport {
    pub index: usize,
    pub range: MultiplierRange,
    pub outcome: PartitionOutcome,
}

/// Statistics from a partitioned search
#[derive(Debug, Clone, Default)]
pub struct SearchStatistics {
    /// Total time spent searching
    pub elapsed_time: Duration,
    /// Number of worker threads
    pub num_workers: usize,
    /// Number of partitions the domain was split into
    pub partitions_total: u64,
    /// Partitions that produced a candidate
    pub partitions_found: u64,
    /// Partitions with no candidate (including empty ones)
    pub partitions_no_solution: u64,
    /// Empty partitions, settled without an oracle call
    pub partitions_empty: u64,
    pub partitions_inconclusive: u64,
    pub partitions_failed: u64,
    pub partitions_cancelled: u64,
    /// Number of oracle queries made
    pub oracle_calls: u64,
    /// Total time spent inside oracle calls, across workers
    pub oracle_time: Duration,
}

impl SearchStatistics {
    pub fn record(&mut self, report: &PartitionReport) {
        match report.outcome {
            PartitionOutcome::Found(_) => self.partitions_found += 1,
            PartitionOutcome::NoSolution => {
                self.partitions_no_solution += 1;
                if report.range.is_empty() {
                    self.partitions_empty += 1;
                }
            }
            PartitionOutcome::Inconclusive(_) => self.partitions_inconclusive += 1,
            PartitionOutcome::Failed(_) => self.partitions_failed += 1,
            PartitionOutcome::Cancelled => self.partitions_cancelled += 1,
        }
    }

    /// Number of partitions without a definite answer
    pub fn partitions_unresolved(&self) -> u64 {
        self.partitions_inconclusive + self.partitions_failed + self.partitions_cancelled
    }

    /// Get oracle queries per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.oracle_calls as f64 / secs
        }
    }

    /// Format statistics as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Time: {:.2?}\n", self.elapsed_time));
        s.push_str(&format!("Workers: {}\n", self.num_workers));
        s.push_str(&format!(
            "Partitions: {} ({} empty)\n",
            self.partitions_total, self.partitions_empty
        ));
        s.push_str(&format!(
            "Oracle queries: {} ({:.1} queries/sec)\n",
            self.oracle_calls,
            self.throughput()
        ));
        s.push_str(&format!("Found: {}\n", self.partitions_found));
        s.push_str(&format!("No solution: {}\n", self.partitions_no_solution));

        if self.partitions_unresolved() > 0 {
            s.push_str(&format!(
                "Unresolved: {} inconclusive, {} failed, {} cancelled\n",
                self.partitions_inconclusive, self.partitions_failed, self.partitions_cancelled
            ));
        }

        s
    }
}

/// Aggregated result of a partitioned search, before verification
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub divisor: Divisor,
    /// Every candidate returned by a partition, duplicates included
    pub candidates: Vec<Candidate>,
    /// One report per partition, in partition order
    pub partitions: Vec<PartitionReport>,
    pub statistics: SearchStatistics,
}

impl SearchResult {
    /// Candidates sorted and deduplicated
    pub fn distinct_candidates(&self) -> Vec<Candidate> {
        let mut candidates = self.candidates.clone();
        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }

    /// Partitions without a definite answer
    pub fn unresolved_partitions(&self) -> impl Iterator<Item = &PartitionReport> {
        self.partitions.iter().filter(|p| !p.outcome.is_settled())
    }

    /// True when every partition was explored to a definite answer
    pub fn is_complete(&self) -> bool {
        self.unresolved_partitions().next().is_none()
    }
}

/// The answer to "how do I divide by d with a multiply and a shift?"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// One or more verified (multiplier, shift) pairs
    Solutions(Vec<Candidate>),
    /// The whole space was explored and nothing verified
    NoSolution,
    /// Nothing verified, and some of the space could not be decided
    Inconclusive {
        /// Partitions that were inconclusive, failed or cancelled
        ranges: Vec<MultiplierRange>,
        /// Candidates whose verification was inconclusive
        unverified: Vec<Candidate>,
    },
}

impl Verdict {
    pub fn solutions(&self) -> &[Candidate] {
        match self {
            Verdict::Solutions(solutions) => solutions,
            _ => &[],
        }
    }
}

/// Full report of a search-and-verify run
#[derive(Debug, Clone)]
pub struct MagicReport {
    pub divisor: Divisor,
    pub verdict: Verdict,
    /// The partitioned search, unless the fast path already succeeded
    pub search: Option<SearchResult>,
    /// Outcome of the scaled fast path, if it was attempted
    pub fast_path: Option<ScaledOutcome>,
    /// Verification outcome of every distinct candidate
    pub verifications: Vec<(Candidate, VerificationOutcome)>,
}

impl MagicReport {
    /// Candidates proven wrong by the verifier
    pub fn rejected(&self) -> impl Iterator<Item = &(Candidate, VerificationOutcome)> {
        self.verifications
            .iter()
            .filter(|(_, outcome)| matches!(outcome, VerificationOutcome::Rejected(_)))
    }
}

impl fmt::Display for MagicReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Divisor: {}", self.divisor)?;
        match &self.verdict {
            Verdict::Solutions(solutions) => {
                writeln!(f, "Verified solutions ({}):", solutions.len())?;
                for candidate in solutions {
                    writeln!(f, "  {}", candidate)?;
                }
            }
            Verdict::NoSolution => {
                writeln!(f, "No solution found in explored space.")?;
            }
            Verdict::Inconclusive { ranges, unverified } => {
                writeln!(f, "Inconclusive: no verified solution.")?;
                if !ranges.is_empty() {
                    writeln!(f, "Undecided partitions ({}):", ranges.len())?;
                    for range in ranges {
                        writeln!(f, "  {}", range)?;
                    }
                }
                if !unverified.is_empty() {
                    writeln!(f, "Candidates with inconclusive verification:")?;
                    for candidate in unverified {
                        writeln!(f, "  {}", candidate)?;
                    }
                }
            }
        }
        for (candidate, outcome) in self.rejected() {
            writeln!(f, "Rejected {}: {}", candidate, outcome)?;
        }
        Ok(())
    }
}
