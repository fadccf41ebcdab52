//! Totals across the worker pool.

use crate::worker::{WorkerState, WorkerStats};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Per-worker line of a [`DispatchSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub id: usize,
    pub quota: u64,
    pub sent: u64,
    pub failed: u64,
    pub state: WorkerState,
}

/// Result of a dispatch run.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchSummary {
    pub workers: Vec<WorkerReport>,
    /// Records the sinks accepted.
    pub total_sent: u64,
    /// Records whose send failed.
    pub total_failed: u64,
    pub duration_ms: u64,
    pub records_per_second: f64,
    /// Whether the run was cut short by a shutdown request.
    pub interrupted: bool,
}

impl DispatchSummary {
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

/// Reads every worker's counters on demand.
///
/// A snapshot can be taken at any time: workers that never started count as
/// zero and running workers report their count as of that instant.
#[derive(Debug, Default, Clone)]
pub struct ShutdownAggregator {
    workers: Vec<Arc<WorkerStats>>,
}

impl ShutdownAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, stats: Arc<WorkerStats>) {
        self.workers.push(stats);
    }

    pub fn total_sent(&self) -> u64 {
        self.workers.iter().map(|w| w.sent()).sum()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn snapshot(&self, elapsed: Duration, interrupted: bool) -> DispatchSummary {
        let workers: Vec<WorkerReport> = self
            .workers
            .iter()
            .map(|w| WorkerReport {
                id: w.id(),
                quota: w.quota(),
                sent: w.sent(),
                failed: w.failed(),
                state: w.state(),
            })
            .collect();

        let total_sent = workers.iter().map(|w| w.sent).sum();
        let total_failed = workers.iter().map(|w| w.failed).sum();
        let records_per_second = if elapsed.as_secs_f64() > 0.0 {
            total_sent as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        DispatchSummary {
            workers,
            total_sent,
            total_failed,
            duration_ms: elapsed.as_millis() as u64,
            records_per_second,
            interrupted,
        }
    }

    /// Whether every registered worker has reached [`WorkerState::Stopped`].
    pub fn all_stopped(&self) -> bool {
        self.workers
            .iter()
            .all(|w| w.state() == WorkerState::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unstarted_workers_count_as_zero() {
        let mut aggregator = ShutdownAggregator::new();
        aggregator.register(Arc::new(WorkerStats::new(0, 10)));
        aggregator.register(Arc::new(WorkerStats::new(1, 10)));

        let summary = aggregator.snapshot(Duration::ZERO, true);
        assert_eq!(summary.total_sent, 0);
        assert_eq!(summary.worker_count(), 2);
        assert_eq!(summary.records_per_second, 0.0);
        assert!(summary.workers.iter().all(|w| w.state == WorkerState::Starting));
        assert!(!aggregator.all_stopped());
    }

    #[test]
    fn test_empty_pool() {
        let summary = ShutdownAggregator::new().snapshot(Duration::from_secs(1), false);
        assert_eq!(summary.total_sent, 0);
        assert_eq!(summary.worker_count(), 0);
    }

    #[test]
    fn test_summary_serializes_states_lowercase() {
        let mut aggregator = ShutdownAggregator::new();
        aggregator.register(Arc::new(WorkerStats::new(3, 7)));
        let json = serde_json::to_value(aggregator.snapshot(Duration::from_secs(2), false)).unwrap();

        assert_eq!(json["workers"][0]["state"], "starting");
        assert_eq!(json["workers"][0]["quota"], 7);
        assert_eq!(json["duration_ms"], 2000);
    }
}
