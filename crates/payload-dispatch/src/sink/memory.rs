//! In-memory sink standing in for the broker in tests.

use super::{Deliveries, RecordSink, SinkFactory};
use crate::error::DispatchError;
use crate::task::DispatchTask;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub(crate) struct MemorySinkFactory {
    sent: Arc<Mutex<Vec<(usize, String)>>>,
    fail_every: Option<usize>,
    send_delay: Option<Duration>,
    fail_open: bool,
    deferred: bool,
}

impl MemorySinkFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail every `n`-th send of each worker.
    pub(crate) fn failing_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    pub(crate) fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    /// Hold accepted payloads until flush, like a client-side buffer.
    pub(crate) fn deferring_delivery(mut self) -> Self {
        self.deferred = true;
        self
    }

    pub(crate) fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// `(worker_id, payload)` for every delivered payload, in delivery order.
    pub(crate) fn sent(&self) -> Vec<(usize, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SinkFactory for MemorySinkFactory {
    async fn open(&self, worker_id: usize) -> Result<Box<dyn RecordSink>, DispatchError> {
        if self.fail_open {
            return Err(DispatchError::Io(std::io::Error::other("connection refused")));
        }
        Ok(Box::new(MemorySink {
            worker_id,
            attempts: 0,
            sent: self.sent.clone(),
            fail_every: self.fail_every,
            send_delay: self.send_delay,
            deferred: self.deferred.then(Vec::new),
            resolved: Deliveries::default(),
        }))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

struct MemorySink {
    worker_id: usize,
    attempts: usize,
    sent: Arc<Mutex<Vec<(usize, String)>>>,
    fail_every: Option<usize>,
    send_delay: Option<Duration>,
    deferred: Option<Vec<String>>,
    resolved: Deliveries,
}

impl MemorySink {
    fn deliver(&mut self, payload: String) {
        self.sent.lock().unwrap().push((self.worker_id, payload));
        self.resolved.sent += 1;
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn send(&mut self, task: &DispatchTask) -> Result<(), DispatchError> {
        self.attempts += 1;
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_every.is_some_and(|n| self.attempts % n == 0) {
            return Err(DispatchError::Io(std::io::Error::other("broker unavailable")));
        }
        match &mut self.deferred {
            Some(buffer) => buffer.push(task.payload.clone()),
            None => self.deliver(task.payload.clone()),
        }
        Ok(())
    }

    fn completed(&mut self) -> Deliveries {
        std::mem::take(&mut self.resolved)
    }

    async fn flush(&mut self) -> Result<Deliveries, DispatchError> {
        let buffered = self.deferred.as_mut().map(std::mem::take).unwrap_or_default();
        for payload in buffered {
            self.deliver(payload);
        }
        Ok(self.completed())
    }
}
