//! Bounded FIFO hand-off between generation and the worker pool.
//!
//! Generators push through cloned [`QueueProducer`]s and block once the queue
//! is full. Workers share one [`DispatchQueue`] and pop in turn. Once every
//! producer is dropped and the queue is empty, [`DispatchQueue::pop`] returns
//! `None`, which is the normal end-of-work signal for a worker. Dropping the
//! last `DispatchQueue` makes any pending or future push fail, so generators
//! stop as soon as no worker is left to consume.

use crate::error::DispatchError;
use crate::task::DispatchTask;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Create a queue holding at most `capacity` pending tasks.
pub fn dispatch_queue(capacity: NonZeroUsize) -> (QueueProducer, Arc<DispatchQueue>) {
    let (tx, rx) = mpsc::channel(capacity.get());
    (
        QueueProducer { tx },
        Arc::new(DispatchQueue {
            rx: Mutex::new(rx),
            capacity: capacity.get(),
        }),
    )
}

/// Push side of the dispatch queue.
#[derive(Debug, Clone)]
pub struct QueueProducer {
    tx: mpsc::Sender<DispatchTask>,
}

impl QueueProducer {
    /// Push a task, waiting for space when the queue is full.
    pub async fn push(&self, task: DispatchTask) -> Result<(), DispatchError> {
        self.tx
            .send(task)
            .await
            .map_err(|_| DispatchError::QueueClosed)
    }

    /// Blocking variant of [`QueueProducer::push`] for generator threads.
    ///
    /// Must not be called from within an async context.
    pub fn blocking_push(&self, task: DispatchTask) -> Result<(), DispatchError> {
        self.tx
            .blocking_send(task)
            .map_err(|_| DispatchError::QueueClosed)
    }
}

/// Pop side of the dispatch queue, shared by all workers.
#[derive(Debug)]
pub struct DispatchQueue {
    rx: Mutex<mpsc::Receiver<DispatchTask>>,
    capacity: usize,
}

impl DispatchQueue {
    /// Take the oldest task, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is drained and no producer remains.
    pub async fn pop(&self) -> Option<DispatchTask> {
        self.rx.lock().await.recv().await
    }

    /// Number of tasks currently waiting.
    pub async fn len(&self) -> usize {
        self.rx.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn task(payload: &str) -> DispatchTask {
        DispatchTask::new(Arc::from("t"), payload.to_string())
    }

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (producer, queue) = dispatch_queue(capacity(4));
        for p in ["a", "b", "c"] {
            producer.push(task(p)).await.unwrap();
        }
        drop(producer);

        let mut popped = Vec::new();
        while let Some(t) = queue.pop().await {
            popped.push(t.payload);
        }
        assert_eq!(popped, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_pop_waits_for_producer() {
        let (producer, queue) = dispatch_queue(capacity(1));

        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        producer.push(task("late")).await.unwrap();

        let popped = consumer.await.unwrap();
        assert_eq!(popped.map(|t| t.payload), Some("late".to_string()));
    }

    #[tokio::test]
    async fn test_full_queue_applies_backpressure() {
        let (producer, queue) = dispatch_queue(capacity(2));
        producer.push(task("1")).await.unwrap();
        producer.push(task("2")).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), producer.push(task("3"))).await;
        assert!(blocked.is_err());
        assert_eq!(queue.len().await, 2);

        queue.pop().await;
        producer.push(task("3")).await.unwrap();
        assert_eq!(queue.len().await, 2);
    }

    #[tokio::test]
    async fn test_push_fails_after_consumers_are_gone() {
        let (producer, queue) = dispatch_queue(capacity(2));
        drop(queue);
        assert!(matches!(
            producer.push(task("x")).await,
            Err(DispatchError::QueueClosed)
        ));
    }

    #[tokio::test]
    async fn test_blocking_push_from_thread() {
        let (producer, queue) = dispatch_queue(capacity(8));
        let generator = tokio::task::spawn_blocking(move || {
            for i in 0..5 {
                producer.blocking_push(task(&i.to_string())).unwrap();
            }
        });

        let mut count = 0;
        while queue.pop().await.is_some() {
            count += 1;
        }
        generator.await.unwrap();
        assert_eq!(count, 5);
        assert!(queue.is_empty().await);
        assert_eq!(queue.capacity(), 8);
    }
}
