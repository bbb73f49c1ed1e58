//! Configuration for partitioned parallel search.

use std::time::Duration;

/// Default number of partitions handed out per worker.
///
/// Many small partitions keep each oracle query cheap and let fast workers
/// pick up slack from slow ones.
pub const DEFAULT_PARTITIONS_PER_WORKER: usize = 1024;

/// Configuration for partitioned parallel search.
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of worker threads to spawn.
    pub num_workers: usize,
    /// Partitions per worker; the domain is split into
    /// `partitions_per_worker * num_workers` ranges.
    pub partitions_per_worker: usize,
    /// Overall deadline. Partitions not yet dispatched when it expires are
    /// reported as cancelled.
    pub timeout: Option<Duration>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get().max(1),
            partitions_per_worker: DEFAULT_PARTITIONS_PER_WORKER,
            timeout: None,
        }
    }
}

impl ParallelConfig {
    /// Create a new parallel config with the specified number of workers.
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers.max(1);
        self
    }

    /// Set the worker count from an Option, keeping the default for None.
    pub fn with_workers_option(self, num_workers: Option<usize>) -> Self {
        match num_workers {
            Some(n) => self.with_workers(n),
            None => self,
        }
    }

    /// Set the number of partitions per worker.
    pub fn with_partitions_per_worker(mut self, partitions: usize) -> Self {
        self.partitions_per_worker = partitions.max(1);
        self
    }

    /// Set the overall timeout for parallel search.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the overall timeout from an Option.
    pub fn with_timeout_option(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total number of partitions of the multiplier domain.
    pub fn part_count(&self) -> usize {
        self.partitions_per_worker.saturating_mul(self.num_workers)
    }
}
