//! Run configuration: CLI/environment arguments and their validation.
//!
//! Every check happens in [`WorkloadConfig::from_args`], before any worker or
//! generator is started, so a bad configuration never sends anything.

pub mod duration;
pub mod properties;

use chrono::{NaiveDateTime, TimeDelta};
use clap::{Args, ValueEnum};
use payload_dispatch::sink::kafka_client_config;
use payload_dispatch::{DispatchArgs, DispatchError, KafkaArgs, PoolConfig, Throughput};
use payload_generator::{
    parse_datetime, GenerationSession, GeneratorError, PayloadRenderer, TemporalDefaults,
};
use rdkafka::ClientConfig;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Where rendered payloads go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Send every payload to a Kafka topic
    #[default]
    Producer,
    /// Write every payload as one line to a file or stdout
    Batch,
}

/// Workload generator arguments.
#[derive(Args, Clone, Debug)]
pub struct WorkloadArgs {
    /// Run mode
    #[arg(long, env = "RUNTIME_MODE", value_enum, default_value_t = RunMode::Producer)]
    pub mode: RunMode,

    /// Path to the Handlebars payload template
    #[arg(long, short = 'f', env = "PAYLOAD_TEMPLATE", default_value = "payload.hbs")]
    pub payload_template: PathBuf,

    /// Number of records to generate
    #[arg(long, short = 'r', env = "NUM_RECORDS", default_value = "100")]
    pub num_records: u64,

    /// Target Kafka topic (required in producer mode)
    #[arg(long, short = 't', env = "TOPIC")]
    pub topic: Option<String>,

    #[command(flatten)]
    pub kafka: KafkaArgs,

    #[command(flatten)]
    pub dispatch: DispatchArgs,

    /// Number of threads rendering payloads into the queue
    #[arg(long, env = "GENERATOR_THREADS", default_value = "1")]
    pub generator_threads: usize,

    /// Default start for temporal fields (dd-MM-yyyy'T'HH:mm:ss)
    #[arg(long, env = "START_TIMESTAMP")]
    pub start_timestamp: Option<String>,

    /// Default end for temporal fields (dd-MM-yyyy'T'HH:mm:ss)
    #[arg(long, env = "END_TIMESTAMP")]
    pub end_timestamp: Option<String>,

    /// Default step for sequential temporal fields without an end (e.g. "30s", "5m")
    #[arg(long, env = "TIMESTAMP_INTERVAL")]
    pub timestamp_interval: Option<String>,

    /// Output file for batch mode ("-" for stdout)
    #[arg(long, short = 'o', env = "OUTPUT", default_value = "-")]
    pub output_file: PathBuf,

    /// Grace period for workers after Ctrl+C before they are aborted
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value = "10s")]
    pub shutdown_timeout: String,

    /// Write the run report as JSON to this path
    #[arg(long, env = "METRICS_OUTPUT")]
    pub metrics_output: Option<PathBuf>,
}

/// Configuration errors, all detected before the run starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Number of records must be at least 1")]
    NoRecords,

    #[error("Number of producers must be at least 1")]
    NoProducers,

    #[error("Number of generator threads must be at least 1")]
    NoGeneratorThreads,

    #[error("Queue capacity must be at least 1")]
    NoQueueCapacity,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Invalid payload template: {0}")]
    Template(#[from] GeneratorError),

    #[error("Invalid {option} '{value}': expected dd-MM-yyyy'T'HH:mm:ss")]
    InvalidTimestamp { option: &'static str, value: String },

    #[error("End timestamp {end} is before start timestamp {start}")]
    EndBeforeStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Invalid {option} '{value}': {reason}")]
    InvalidDuration {
        option: &'static str,
        value: String,
        reason: String,
    },

    #[error("A topic is required in producer mode (--topic or TOPIC)")]
    MissingTopic,

    #[error("Failed to read producer config {path:?}: {source}")]
    PropertiesRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid producer config {path:?} line {line}: {reason}")]
    Properties {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Sink selection resolved from the run mode.
pub enum SinkConfig {
    Kafka {
        client: ClientConfig,
        /// Partition count when the topic should be created first.
        create_topic: Option<i32>,
    },
    File(PathBuf),
}

/// Validated configuration for one run.
pub struct WorkloadConfig {
    pub mode: RunMode,
    pub total_records: u64,
    pub topic: Arc<str>,
    pub renderer: Arc<PayloadRenderer>,
    pub sink: SinkConfig,
    pub pool: PoolConfig,
    pub queue_capacity: NonZeroUsize,
    pub generator_threads: NonZeroUsize,
    pub metrics_output: Option<PathBuf>,
}

impl WorkloadConfig {
    /// Validate `args` and compile the payload template.
    pub fn from_args(args: WorkloadArgs) -> Result<Self, ConfigError> {
        if args.num_records == 0 {
            return Err(ConfigError::NoRecords);
        }
        if args.dispatch.num_producers == 0 {
            return Err(ConfigError::NoProducers);
        }
        let generator_threads =
            NonZeroUsize::new(args.generator_threads).ok_or(ConfigError::NoGeneratorThreads)?;
        let queue_capacity =
            NonZeroUsize::new(args.dispatch.queue_capacity).ok_or(ConfigError::NoQueueCapacity)?;
        let throughput = Throughput::from_records_per_second(args.dispatch.throughput)?;
        let shutdown_timeout = parse_duration_option("--shutdown-timeout", &args.shutdown_timeout)?;
        let temporal = temporal_defaults(&args)?;

        let topic = match (args.mode, args.topic) {
            (_, Some(topic)) if !topic.trim().is_empty() => topic,
            (RunMode::Producer, _) => return Err(ConfigError::MissingTopic),
            (RunMode::Batch, _) => String::new(),
        };

        let sink = match args.mode {
            RunMode::Producer => {
                let overrides = match &args.kafka.producer_config {
                    Some(path) => properties::load_properties(path)?,
                    None => Vec::new(),
                };
                SinkConfig::Kafka {
                    client: kafka_client_config(&args.kafka.bootstrap_servers, &overrides),
                    create_topic: args.kafka.create_topic.then_some(args.kafka.partitions),
                }
            }
            RunMode::Batch => SinkConfig::File(args.output_file),
        };

        let session =
            GenerationSession::new(args.num_records).with_temporal_defaults(temporal);
        let renderer = PayloadRenderer::from_file(&args.payload_template, Arc::new(session))?;

        Ok(Self {
            mode: args.mode,
            total_records: args.num_records,
            topic: Arc::from(topic),
            renderer: Arc::new(renderer),
            sink,
            pool: PoolConfig {
                workers: args.dispatch.num_producers,
                total_records: args.num_records,
                throughput,
                scope: args.dispatch.throughput_scope,
                shutdown_timeout,
            },
            queue_capacity,
            generator_threads,
            metrics_output: args.metrics_output,
        })
    }
}

fn temporal_defaults(args: &WorkloadArgs) -> Result<TemporalDefaults, ConfigError> {
    let start = parse_timestamp_option("--start-timestamp", args.start_timestamp.as_deref())?;
    let end = parse_timestamp_option("--end-timestamp", args.end_timestamp.as_deref())?;
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ConfigError::EndBeforeStart { start, end });
        }
    }

    let interval = match &args.timestamp_interval {
        Some(value) => {
            let duration = parse_duration_option("--timestamp-interval", value)?;
            let delta = TimeDelta::from_std(duration).map_err(|e| ConfigError::InvalidDuration {
                option: "--timestamp-interval",
                value: value.clone(),
                reason: e.to_string(),
            })?;
            Some(delta)
        }
        None => None,
    };

    Ok(TemporalDefaults {
        start,
        end,
        interval,
    })
}

fn parse_timestamp_option(
    option: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDateTime>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    parse_datetime(value)
        .map(Some)
        .ok_or_else(|| ConfigError::InvalidTimestamp {
            option,
            value: value.to_string(),
        })
}

fn parse_duration_option(option: &'static str, value: &str) -> Result<Duration, ConfigError> {
    duration::parse_duration(value).map_err(|e| ConfigError::InvalidDuration {
        option,
        value: value.to_string(),
        reason: format!("{e:#}"),
    })
}
