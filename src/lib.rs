//! Kafka workload generator library.
//!
//! Renders a Handlebars payload template into a fixed number of records and
//! sends them to a Kafka topic (or a file, in batch mode) at a controlled
//! rate from a pool of concurrent producer workers.
//!
//! # Crates
//!
//! - `payload_generator` - sequential and random field generators, the
//!   per-run generator registry, and the template renderer
//! - `payload_dispatch` - the bounded dispatch queue, producer workers,
//!   pacing, sinks, and the shutdown aggregator
//!
//! This crate adds configuration ([`config`]) and the run wiring ([`run`]).

pub mod config;
pub mod run;

pub use config::{ConfigError, RunMode, WorkloadArgs, WorkloadConfig};
pub use run::{run_workload, RunReport};
