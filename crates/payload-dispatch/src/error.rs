//! Error types for payload dispatch.

use thiserror::Error;

/// Errors that can occur while setting up or running the dispatch pipeline.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dispatch queue is closed")]
    QueueClosed,

    #[error("Invalid throughput {0}: use -1 for unlimited or a positive number of records per second")]
    InvalidThroughput(i64),

    #[error("At least one producer worker is required")]
    NoWorkers,

    #[error("Topic creation error: {0}")]
    TopicCreation(String),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
