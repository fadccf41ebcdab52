//! Rate-limited concurrent dispatch of rendered payloads.
//!
//! # Architecture
//!
//! ```text
//! generator threads ──blocking_push──▶ DispatchQueue (bounded FIFO)
//!                                            │ pop
//!                      ┌─────────────────────┼─────────────────────┐
//!                      ▼                     ▼                     ▼
//!               ProducerWorker 0      ProducerWorker 1  ...  ProducerWorker N-1
//!               (quota, Pacer)        (quota, Pacer)         (quota, Pacer)
//!                      │                     │                     │
//!                      └──────── RecordSink (Kafka / file) ────────┘
//!
//! ShutdownAggregator reads every worker's WorkerStats → DispatchSummary
//! ```
//!
//! Workers stop when their quota is reached, when the queue is drained and
//! closed, or when the shared [`CancellationToken`](tokio_util::sync::CancellationToken)
//! fires. [`WorkerPool::join`] waits for all of them (bounded by the shutdown
//! timeout once cancelled) before summarizing.

pub mod aggregate;
pub mod args;
pub mod error;
pub mod pacing;
pub mod pool;
pub mod queue;
pub mod sink;
pub mod task;
pub mod worker;

pub use aggregate::{DispatchSummary, ShutdownAggregator, WorkerReport};
pub use args::{DispatchArgs, KafkaArgs};
pub use error::DispatchError;
pub use pacing::{Pacer, PacingScope, Throughput};
pub use pool::{quotas, PoolConfig, WorkerPool};
pub use queue::{dispatch_queue, DispatchQueue, QueueProducer};
pub use sink::{Deliveries, FileSinkFactory, KafkaSinkFactory, RecordSink, SinkFactory};
pub use task::DispatchTask;
pub use worker::{ProducerWorker, WorkerState, WorkerStats};
