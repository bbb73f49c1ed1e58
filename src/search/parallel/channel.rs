//! Work queue and result channel for partition workers.

use crate::ir::MultiplierRange;
use crate::search::result::PartitionOutcome;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// One unit of work: a partition of the multiplier domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionJob {
    pub index: usize,
    pub range: MultiplierRange,
}

/// Message sent from workers to the coordinator.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Worker has settled one partition.
    PartitionDone {
        worker_id: usize,
        index: usize,
        outcome: PartitionOutcome,
        elapsed: Duration,
        /// False when the partition was settled without a query.
        oracle_called: bool,
    },
    /// Worker found the queue drained and is exiting.
    Finished {
        worker_id: usize,
        partitions_processed: u64,
    },
}

/// Shared cancellation flag.
///
/// Cancelling stops workers from dispatching further oracle calls; partitions
/// they pick up afterwards are reported as cancelled. Calls already in flight
/// run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal all workers to stop dispatching.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Channel endpoints for a worker.
pub struct WorkerChannels {
    /// Shared queue of partitions still to be processed.
    pub jobs: Receiver<PartitionJob>,
    /// Send messages to coordinator.
    pub to_coordinator: Sender<WorkerMessage>,
    pub cancel: CancelToken,
}

/// Channel endpoints for the coordinator.
pub struct CoordinatorChannels {
    /// Receive messages from workers.
    pub from_workers: Receiver<WorkerMessage>,
    pub cancel: CancelToken,
}

/// Create the job queue, pre-filled with `jobs`, and the result channel for
/// `num_workers` workers.
///
/// The queue's sender is dropped once filled, so workers see a disconnected
/// queue as soon as every job has been taken.
pub fn create_channels(
    jobs: Vec<PartitionJob>,
    num_workers: usize,
    cancel: CancelToken,
) -> (CoordinatorChannels, Vec<WorkerChannels>) {
    let (job_tx, job_rx) = unbounded();
    for job in jobs {
        // The receiver is alive, so this cannot fail
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    // Unbounded channel from workers to coordinator (workers shouldn't block)
    let (worker_tx, coordinator_rx) = unbounded();

    let worker_channels = (0..num_workers.max(1))
        .map(|_| WorkerChannels {
            jobs: job_rx.clone(),
            to_coordinator: worker_tx.clone(),
            cancel: cancel.clone(),
        })
        .collect();

    let coordinator = CoordinatorChannels {
        from_workers: coordinator_rx,
        cancel,
    };

    (coordinator, worker_channels)
}
