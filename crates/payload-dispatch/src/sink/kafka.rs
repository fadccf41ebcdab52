//! Kafka sink built on the rdkafka future producer.

use super::{Deliveries, RecordSink, SinkFactory};
use crate::error::DispatchError;
use crate::task::DispatchTask;
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{DeliveryFuture, FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How long draining waits for buffered messages to be delivered.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause before retrying an enqueue when the local producer queue is full and
/// no delivery of ours is outstanding to wait on.
const QUEUE_FULL_BACKOFF: Duration = Duration::from_millis(10);

/// Client configuration with the producer defaults, then `overrides` applied
/// in order (typically the entries of a properties file).
pub fn kafka_client_config(bootstrap_servers: &str, overrides: &[(String, String)]) -> ClientConfig {
    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", bootstrap_servers)
        .set("message.timeout.ms", "30000")
        .set("queue.buffering.max.messages", "100000")
        .set("queue.buffering.max.kbytes", "1048576")
        .set("batch.size", "65536")
        .set("linger.ms", "5");
    for (key, value) in overrides {
        config.set(key, value);
    }
    config
}

/// Create `topic` with `partitions` partitions unless it already exists.
pub async fn ensure_topic(
    config: &ClientConfig,
    topic: &str,
    partitions: i32,
) -> Result<(), DispatchError> {
    let admin_client: AdminClient<DefaultClientContext> = config.create()?;

    let new_topic = NewTopic::new(topic, partitions, TopicReplication::Fixed(1));
    let opts = AdminOptions::new().operation_timeout(Some(Duration::from_secs(10)));

    let results = admin_client
        .create_topics(&[new_topic], &opts)
        .await
        .map_err(|e| DispatchError::TopicCreation(format!("Failed to create topic: {e}")))?;

    for result in results {
        match result {
            Ok(topic_name) => info!("Topic '{}' created successfully", topic_name),
            Err((topic_name, err)) => {
                let err_str = err.to_string();
                if err_str.contains("already exists") || err_str.contains("TopicExistsException") {
                    info!("Topic '{}' already exists", topic_name);
                } else {
                    return Err(DispatchError::TopicCreation(format!(
                        "Failed to create topic {topic_name}: {err}"
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Gives every worker its own producer over the same client configuration.
pub struct KafkaSinkFactory {
    config: ClientConfig,
}

impl KafkaSinkFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SinkFactory for KafkaSinkFactory {
    async fn open(&self, worker_id: usize) -> Result<Box<dyn RecordSink>, DispatchError> {
        let producer: FutureProducer = self.config.create()?;
        debug!("Worker {} connected to Kafka", worker_id);
        Ok(Box::new(KafkaSink::new(producer)))
    }

    fn describe(&self) -> String {
        format!(
            "kafka://{}",
            self.config.get("bootstrap.servers").unwrap_or("<unset>")
        )
    }
}

type DeliveryOutcome = <DeliveryFuture as Future>::Output;

struct KafkaSink {
    producer: FutureProducer,
    pending: FuturesUnordered<DeliveryFuture>,
    resolved: Deliveries,
}

impl KafkaSink {
    fn new(producer: FutureProducer) -> Self {
        Self {
            producer,
            pending: FuturesUnordered::new(),
            resolved: Deliveries::default(),
        }
    }

    fn absorb(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            Ok(Ok(_)) => self.resolved.sent += 1,
            Ok(Err((err, _))) => {
                self.resolved.failed += 1;
                warn!("Kafka delivery failed: {}", err);
            }
            Err(_) => {
                self.resolved.failed += 1;
                warn!("Kafka delivery report was dropped");
            }
        }
    }

    /// Wait until the producer queue is likely to have room again.
    async fn wait_for_room(&mut self) {
        match self.pending.next().await {
            Some(outcome) => self.absorb(outcome),
            None => tokio::time::sleep(QUEUE_FULL_BACKOFF).await,
        }
    }
}

#[async_trait]
impl RecordSink for KafkaSink {
    async fn send(&mut self, task: &DispatchTask) -> Result<(), DispatchError> {
        let mut record = FutureRecord::<(), _>::to(&task.topic).payload(task.payload.as_bytes());
        loop {
            match self.producer.send_result(record) {
                Ok(delivery) => {
                    self.pending.push(delivery);
                    return Ok(());
                }
                // A full local queue is backpressure, not a failed send.
                Err((KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull), returned)) => {
                    record = returned;
                    self.wait_for_room().await;
                }
                Err((err, _)) => return Err(DispatchError::Kafka(err)),
            }
        }
    }

    fn completed(&mut self) -> Deliveries {
        while let Some(Some(outcome)) = self.pending.next().now_or_never() {
            self.absorb(outcome);
        }
        std::mem::take(&mut self.resolved)
    }

    async fn flush(&mut self) -> Result<Deliveries, DispatchError> {
        let producer = self.producer.clone();
        let flushed = tokio::task::spawn_blocking(move || producer.flush(FLUSH_TIMEOUT)).await?;
        if let Err(e) = flushed {
            warn!("Kafka flush did not complete: {}", e);
        }

        let deadline = Instant::now() + FLUSH_TIMEOUT;
        loop {
            let next = tokio::time::timeout_at(deadline, self.pending.next()).await;
            match next {
                Ok(Some(outcome)) => self.absorb(outcome),
                Ok(None) => break,
                Err(_) => {
                    let unresolved = self.pending.len() as u64;
                    warn!(
                        "{} Kafka deliveries still unresolved after flush, counting them as failed",
                        unresolved
                    );
                    self.resolved.failed += unresolved;
                    self.pending = FuturesUnordered::new();
                    break;
                }
            }
        }

        Ok(std::mem::take(&mut self.resolved))
    }
}
