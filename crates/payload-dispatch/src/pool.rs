//! Worker pool: quota assignment, spawning, and bounded shutdown.

use crate::aggregate::{DispatchSummary, ShutdownAggregator};
use crate::error::DispatchError;
use crate::pacing::{Pacer, PacingScope, Throughput};
use crate::queue::DispatchQueue;
use crate::sink::SinkFactory;
use crate::worker::{ProducerWorker, WorkerStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Split `total` records across `workers`, handing the remainder to the
/// lowest-numbered workers so the quotas sum to `total`.
pub fn quotas(total: u64, workers: usize) -> Vec<u64> {
    if workers == 0 {
        return Vec::new();
    }
    let n = workers as u64;
    let (base, remainder) = (total / n, total % n);
    (0..n).map(|i| base + u64::from(i < remainder)).collect()
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub workers: usize,
    pub total_records: u64,
    pub throughput: Throughput,
    pub scope: PacingScope,
    pub shutdown_timeout: Duration,
}

/// Running set of producer workers.
pub struct WorkerPool {
    tasks: JoinSet<(usize, Result<(), DispatchError>)>,
    aggregator: ShutdownAggregator,
    cancel: CancellationToken,
    shutdown_timeout: Duration,
    started: Instant,
}

impl WorkerPool {
    /// Spawn one worker per configured slot. Must be called from within a
    /// tokio runtime.
    pub fn start(
        config: &PoolConfig,
        queue: Arc<DispatchQueue>,
        sinks: Arc<dyn SinkFactory>,
        cancel: CancellationToken,
    ) -> Result<Self, DispatchError> {
        if config.workers == 0 {
            return Err(DispatchError::NoWorkers);
        }

        let pacer = Pacer::new(config.throughput, config.scope, config.workers);
        info!(
            "Starting {} producers for {} records to {} (throughput: {}, pause: {:?})",
            config.workers,
            config.total_records,
            sinks.describe(),
            config.throughput,
            pacer.pause().unwrap_or_default()
        );

        let mut tasks = JoinSet::new();
        let mut aggregator = ShutdownAggregator::new();
        for (id, quota) in quotas(config.total_records, config.workers)
            .into_iter()
            .enumerate()
        {
            let stats = Arc::new(WorkerStats::new(id, quota));
            aggregator.register(stats.clone());
            let worker = ProducerWorker::new(
                stats,
                pacer,
                queue.clone(),
                sinks.clone(),
                cancel.clone(),
            );
            tasks.spawn(async move { (id, worker.run().await) });
        }

        Ok(Self {
            tasks,
            aggregator,
            cancel,
            shutdown_timeout: config.shutdown_timeout,
            started: Instant::now(),
        })
    }

    /// Live view of the workers' counters.
    pub fn aggregator(&self) -> &ShutdownAggregator {
        &self.aggregator
    }

    /// Wait for every worker to stop and summarize the run.
    ///
    /// After a shutdown request, workers get `shutdown_timeout` to stop on
    /// their own; stragglers are then aborted and reported as they stand.
    pub async fn join(mut self) -> DispatchSummary {
        let cancel = self.cancel.clone();
        let grace = self.shutdown_timeout;
        let deadline = async move {
            cancel.cancelled().await;
            tokio::time::sleep(grace).await;
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                joined = self.tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((id, Err(e)))) => error!("Worker {} failed: {}", id, e),
                    Some(Ok((_, Ok(())))) => {}
                    Some(Err(e)) => error!("Worker task failed: {}", e),
                },
                _ = &mut deadline => {
                    warn!(
                        "Workers did not stop within {:?} of shutdown, aborting {} remaining",
                        grace,
                        self.tasks.len()
                    );
                    self.tasks.abort_all();
                    while self.tasks.join_next().await.is_some() {}
                    break;
                }
            }
        }

        self.aggregator
            .snapshot(self.started.elapsed(), self.cancel.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::dispatch_queue;
    use crate::sink::memory::MemorySinkFactory;
    use crate::task::DispatchTask;
    use crate::worker::WorkerState;
    use std::collections::HashSet;
    use std::num::NonZeroUsize;

    fn config(workers: usize, total_records: u64, throughput: i64) -> PoolConfig {
        PoolConfig {
            workers,
            total_records,
            throughput: Throughput::from_records_per_second(throughput).unwrap(),
            scope: PacingScope::PerWorker,
            shutdown_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_quotas_sum_to_total() {
        assert_eq!(quotas(100, 4), vec![25, 25, 25, 25]);
        assert_eq!(quotas(10, 3), vec![4, 3, 3]);
        assert_eq!(quotas(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(quotas(0, 2), vec![0, 0]);
        assert!(quotas(5, 0).is_empty());

        for (total, workers) in [(1_000_003, 7), (17, 17), (1, 1)] {
            assert_eq!(quotas(total, workers).iter().sum::<u64>(), total);
        }
    }

    #[tokio::test]
    async fn test_four_workers_send_exactly_one_hundred() {
        let (producer, queue) = dispatch_queue(NonZeroUsize::new(16).unwrap());
        let sinks = Arc::new(MemorySinkFactory::new());
        let cancel = CancellationToken::new();
        let pool = WorkerPool::start(&config(4, 100, -1), queue, sinks.clone(), cancel).unwrap();

        let topic: Arc<str> = Arc::from("orders");
        for i in 0..100 {
            producer
                .push(DispatchTask::new(topic.clone(), i.to_string()))
                .await
                .unwrap();
        }
        drop(producer);

        let summary = pool.join().await;
        assert_eq!(summary.total_sent, 100);
        assert_eq!(summary.worker_count(), 4);
        assert!(!summary.interrupted);
        assert!(summary.workers.iter().all(|w| w.state == WorkerState::Stopped));
        assert!(summary.workers.iter().all(|w| w.quota == 25));

        let distinct: HashSet<_> = sinks.sent().into_iter().map(|(_, p)| p).collect();
        assert_eq!(distinct.len(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_reports_partial_total() {
        let (producer, queue) = dispatch_queue(NonZeroUsize::new(64).unwrap());
        let topic: Arc<str> = Arc::from("orders");
        for i in 0..64 {
            producer
                .push(DispatchTask::new(topic.clone(), i.to_string()))
                .await
                .unwrap();
        }

        let cancel = CancellationToken::new();
        let sinks = Arc::new(MemorySinkFactory::new());
        let pool = WorkerPool::start(&config(2, 64, 1), queue, sinks.clone(), cancel.clone()).unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        cancel.cancel();
        let summary = pool.join().await;

        // Each worker sends at t=0s and t=1s before the cancel lands.
        assert!(summary.interrupted);
        assert_eq!(summary.total_sent, 4);
        assert_eq!(summary.total_sent, sinks.sent().len() as u64);
        assert!(summary.workers.iter().all(|w| w.state == WorkerState::Stopped));
        drop(producer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_busy_and_idle_workers() {
        let (producer, queue) = dispatch_queue(NonZeroUsize::new(4).unwrap());
        producer
            .push(DispatchTask::new(Arc::from("t"), "x".into()))
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        // One worker is stuck in a slow send, the other waits on an empty queue.
        let sinks = Arc::new(MemorySinkFactory::new().with_send_delay(Duration::from_secs(600)));
        let pool = WorkerPool::start(&config(2, 2, -1), queue, sinks, cancel.clone()).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        let start = Instant::now();
        let summary = pool.join().await;

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(summary.total_sent, 0);
        assert!(summary.interrupted);
        drop(producer);
    }

    #[tokio::test]
    async fn test_failed_worker_setup_is_reported_not_fatal() {
        let (producer, queue) = dispatch_queue(NonZeroUsize::new(4).unwrap());
        drop(producer);
        let sinks = Arc::new(MemorySinkFactory::new().failing_open());
        let pool = WorkerPool::start(&config(3, 9, -1), queue, sinks, CancellationToken::new())
            .unwrap();

        let summary = pool.join().await;
        assert_eq!(summary.total_sent, 0);
        assert!(summary.workers.iter().all(|w| w.state == WorkerState::Stopped));
    }

    #[tokio::test]
    async fn test_zero_workers_rejected() {
        let (_producer, queue) = dispatch_queue(NonZeroUsize::new(1).unwrap());
        let result = WorkerPool::start(
            &config(0, 10, -1),
            queue,
            Arc::new(MemorySinkFactory::new()),
            CancellationToken::new(),
        );
        assert!(matches!(result, Err(DispatchError::NoWorkers)));
    }
}
