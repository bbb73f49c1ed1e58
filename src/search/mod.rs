//! Search for multiply-shift replacements of unsigned division
//!
//! This module provides:
//! - Partitioned: the multiplier domain split across a worker pool, one
//!   bounded oracle query per partition
//! - Scaled: a shift-zero fast path tried before the partitioned search
//! - Driver: search followed by verification of every candidate

pub mod config;
pub mod driver;
pub mod parallel;
pub mod result;
pub mod scaled;

pub use config::SearchConfig;
pub use driver::{find_magic, find_magic_with_cancel, find_magic_z3, search};
pub use parallel::{CancelToken, ParallelConfig, run_partitioned_search};
pub use result::{
    MagicReport, PartitionOutcome, PartitionReport, SearchResult, SearchStatistics, Verdict,
};
pub use scaled::{ScaledOutcome, ScaledSearch};
