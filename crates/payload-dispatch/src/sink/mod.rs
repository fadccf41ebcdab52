//! Destinations a worker sends payloads to.
//!
//! Each worker opens its own sink through a shared [`SinkFactory`] when it
//! starts and flushes it once while draining. Delivery outcomes are collected separately from the hand-off, so a sink
//! can keep many payloads in flight.

pub mod file;
pub mod kafka;
#[cfg(test)]
pub(crate) mod memory;

use crate::error::DispatchError;
use crate::task::DispatchTask;
use async_trait::async_trait;

pub use file::FileSinkFactory;
pub use kafka::{ensure_topic, kafka_client_config, KafkaSinkFactory};

/// Delivery outcomes a sink has resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deliveries {
    pub sent: u64,
    pub failed: u64,
}

impl Deliveries {
    pub fn is_empty(&self) -> bool {
        self.sent == 0 && self.failed == 0
    }
}

/// A per-worker handle to the destination.
#[async_trait]
pub trait RecordSink: Send {
    /// Hand one payload to the destination without waiting for delivery.
    /// An error means the payload was rejected and will never be delivered;
    /// the worker does not retry it.
    async fn send(&mut self, task: &DispatchTask) -> Result<(), DispatchError>;

    /// Outcomes resolved since the last call. Never waits.
    fn completed(&mut self) -> Deliveries;

    /// Push out anything still buffered client-side and return the outcomes
    /// of every delivery still outstanding.
    async fn flush(&mut self) -> Result<Deliveries, DispatchError>;
}

/// Opens a [`RecordSink`] for each worker.
#[async_trait]
pub trait SinkFactory: Send + Sync {
    async fn open(&self, worker_id: usize) -> Result<Box<dyn RecordSink>, DispatchError>;

    /// Short name used in logs.
    fn describe(&self) -> String;
}
