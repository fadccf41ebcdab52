//! Producer worker state machine.
//!
//! ```text
//! Starting ──open sink──▶ Running ──quota reached / queue drained / cancelled──▶ Draining ──flush──▶ Stopped
//! ```

use crate::error::DispatchError;
use crate::pacing::Pacer;
use crate::queue::DispatchQueue;
use crate::sink::{Deliveries, SinkFactory};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Lifecycle of a worker. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum WorkerState {
    Starting = 0,
    Running = 1,
    Draining = 2,
    Stopped = 3,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Starting,
            1 => WorkerState::Running,
            2 => WorkerState::Draining,
            _ => WorkerState::Stopped,
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Starting => write!(f, "starting"),
            WorkerState::Running => write!(f, "running"),
            WorkerState::Draining => write!(f, "draining"),
            WorkerState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Counters a worker publishes. Only the owning worker writes them; the
/// aggregator reads them at any time.
#[derive(Debug)]
pub struct WorkerStats {
    id: usize,
    quota: u64,
    sent: AtomicU64,
    failed: AtomicU64,
    state: AtomicU8,
}

impl WorkerStats {
    pub fn new(id: usize, quota: u64) -> Self {
        Self {
            id,
            quota,
            sent: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            state: AtomicU8::new(WorkerState::Starting as u8),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn quota(&self) -> u64 {
        self.quota
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Acquire)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Acquire)
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn record(&self, deliveries: Deliveries) {
        if deliveries.sent > 0 {
            self.sent.fetch_add(deliveries.sent, Ordering::AcqRel);
        }
        if deliveries.failed > 0 {
            self.failed.fetch_add(deliveries.failed, Ordering::AcqRel);
        }
    }

    fn transition(&self, next: WorkerState) {
        let previous = self.state.swap(next as u8, Ordering::AcqRel);
        debug!(
            "Worker {} {} -> {}",
            self.id,
            WorkerState::from_u8(previous),
            next
        );
    }
}

/// Why a worker left the Running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    QuotaReached,
    QueueDrained,
    Cancelled,
}

/// One member of the worker pool.
pub struct ProducerWorker {
    stats: Arc<WorkerStats>,
    pacer: Pacer,
    queue: Arc<DispatchQueue>,
    sinks: Arc<dyn SinkFactory>,
    cancel: CancellationToken,
}

impl ProducerWorker {
    pub fn new(
        stats: Arc<WorkerStats>,
        pacer: Pacer,
        queue: Arc<DispatchQueue>,
        sinks: Arc<dyn SinkFactory>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            stats,
            pacer,
            queue,
            sinks,
            cancel,
        }
    }

    /// Run the worker to completion. The returned error is a setup failure;
    /// send failures are counted and never abort the worker.
    pub async fn run(self) -> Result<(), DispatchError> {
        let id = self.stats.id();
        let mut sink = match self.sinks.open(id).await {
            Ok(sink) => sink,
            Err(e) => {
                error!("Worker {} failed to start: {}", id, e);
                self.stats.transition(WorkerState::Stopped);
                return Err(e);
            }
        };
        self.stats.transition(WorkerState::Running);

        // Records handed to the sink, whether or not delivery has resolved.
        let mut dispatched = 0u64;
        let reason = loop {
            self.stats.record(sink.completed());
            if dispatched >= self.stats.quota() {
                break StopReason::QuotaReached;
            }

            let task = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break StopReason::Cancelled,
                task = self.queue.pop() => task,
            };
            let Some(task) = task else {
                break StopReason::QueueDrained;
            };

            // A hand-off still waiting on the sink is abandoned on cancellation
            // and never retried.
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break StopReason::Cancelled,
                outcome = sink.send(&task) => outcome,
            };
            dispatched += 1;
            if let Err(e) = outcome {
                self.stats.failed.fetch_add(1, Ordering::AcqRel);
                warn!("Worker {} failed to send record: {}", id, e);
            }

            if dispatched >= self.stats.quota() {
                break StopReason::QuotaReached;
            }
            if !self.pacer.wait(&self.cancel).await {
                break StopReason::Cancelled;
            }
        };

        self.stats.transition(WorkerState::Draining);
        self.stats.record(sink.completed());
        match sink.flush().await {
            Ok(outstanding) => self.stats.record(outstanding),
            Err(e) => warn!("Worker {} failed to flush: {}", id, e),
        }
        self.stats.transition(WorkerState::Stopped);

        info!(
            "Worker {} stopped ({:?}): sent {} of {} records, {} failed",
            id,
            reason,
            self.stats.sent(),
            self.stats.quota(),
            self.stats.failed()
        );
        Ok(())
    }
}
