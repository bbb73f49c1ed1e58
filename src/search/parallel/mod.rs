//! Partitioned parallel search over the multiplier domain.
//!
//! # Architecture
//!
//! The parallel search system consists of:
//! - A **coordinator** that splits `[0, 2^W)` into partitions, waits for
//!   every one to be settled and aggregates the outcomes
//! - Multiple **workers** that pull partitions off a shared queue and ask
//!   the oracle for a candidate inside each one
//! - A **channel system** carrying jobs to workers and outcomes back, plus a
//!   shared cancellation flag
//!
//! # Example
//!
//! ```ignore
//! use divmagic::search::parallel::{CancelToken, ParallelConfig, run_partitioned_search};
//!
//! let config = ParallelConfig::default()
//!     .with_workers(4)
//!     .with_timeout(Duration::from_secs(60));
//!
//! let result = run_partitioned_search(divisor, &config, &Z3Oracle::default(), &CancelToken::new());
//! ```

pub mod channel;
pub mod config;
pub mod coordinator;

pub use channel::CancelToken;
pub use config::{DEFAULT_PARTITIONS_PER_WORKER, ParallelConfig};
pub use coordinator::{run_partitioned_search, solve_partition};
