//! CLI argument definitions for the dispatch side of a run.

use crate::pacing::PacingScope;
use clap::Args;
use std::path::PathBuf;

/// Worker pool arguments.
#[derive(Args, Clone, Debug)]
pub struct DispatchArgs {
    /// Number of concurrent producer workers
    #[arg(long, short = 'n', env = "NUM_THREADS", default_value = "1")]
    pub num_producers: usize,

    /// Throughput ceiling in records per second (-1 = unlimited)
    #[arg(long, short = 'T', env = "THROUGHPUT", default_value = "-1", allow_negative_numbers = true)]
    pub throughput: i64,

    /// Whether the throughput ceiling applies to each worker or to all of them together
    #[arg(long, env = "THROUGHPUT_SCOPE", value_enum, default_value_t = PacingScope::PerWorker)]
    pub throughput_scope: PacingScope,

    /// Maximum number of rendered payloads waiting for a worker
    #[arg(long, env = "QUEUE_CAPACITY", default_value = "10000")]
    pub queue_capacity: usize,
}

/// Kafka connection arguments.
#[derive(Args, Clone, Debug)]
pub struct KafkaArgs {
    /// Kafka brokers (comma-separated, e.g., "localhost:9092")
    #[arg(long, env = "KAFKA_BROKERS", default_value = "localhost:9092")]
    pub bootstrap_servers: String,

    /// Producer properties file (key=value per line) applied on top of the defaults
    #[arg(long, short = 'c', env = "PRODUCER_CONFIG")]
    pub producer_config: Option<PathBuf>,

    /// Create the topic before sending if it does not exist
    #[arg(long)]
    pub create_topic: bool,

    /// Partition count used with --create-topic
    #[arg(long, default_value = "3")]
    pub partitions: i32,
}
