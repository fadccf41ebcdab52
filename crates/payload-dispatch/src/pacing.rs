//! Throughput ceiling and per-send pacing.

use crate::error::DispatchError;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::num::NonZeroU64;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sentinel accepted on the command line for "no ceiling".
pub const UNLIMITED: i64 = -1;

/// Target send rate in records per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throughput {
    Unlimited,
    PerSecond(NonZeroU64),
}

impl Throughput {
    /// Interpret a raw ceiling: `-1` is unlimited, positive values are
    /// records per second, anything else is rejected.
    pub fn from_records_per_second(value: i64) -> Result<Self, DispatchError> {
        if value == UNLIMITED {
            return Ok(Throughput::Unlimited);
        }
        u64::try_from(value)
            .ok()
            .and_then(NonZeroU64::new)
            .map(Throughput::PerSecond)
            .ok_or(DispatchError::InvalidThroughput(value))
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Throughput::Unlimited => write!(f, "unlimited"),
            Throughput::PerSecond(n) => write!(f, "{n} records/sec"),
        }
    }
}

/// Whether the ceiling applies to each worker or to the pool as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PacingScope {
    #[default]
    PerWorker,
    Global,
}

/// Sleeps between sends to hold a worker at its share of the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    pause: Option<Duration>,
}

impl Pacer {
    /// Build the pacer for one of `workers` workers.
    ///
    /// Per-worker scope sleeps `round(1000 / T)` ms after each send; global
    /// scope sleeps `round(1000 * workers / T)` ms so the pool together
    /// targets `T`. A pause that rounds to zero disables pacing.
    pub fn new(throughput: Throughput, scope: PacingScope, workers: usize) -> Self {
        let pause = match throughput {
            Throughput::Unlimited => None,
            Throughput::PerSecond(rate) => {
                let share = match scope {
                    PacingScope::PerWorker => 1.0,
                    PacingScope::Global => workers.max(1) as f64,
                };
                let millis = (1000.0 * share / rate.get() as f64).round() as u64;
                (millis > 0).then(|| Duration::from_millis(millis))
            }
        };
        Self { pause }
    }

    pub fn unlimited() -> Self {
        Self { pause: None }
    }

    /// Delay applied after each send, if any.
    pub fn pause(&self) -> Option<Duration> {
        self.pause
    }

    /// Sleep for one pacing interval.
    ///
    /// Returns `false` if `cancel` fires first; the sleep is not resumed.
    pub async fn wait(&self, cancel: &CancellationToken) -> bool {
        match self.pause {
            None => !cancel.is_cancelled(),
            Some(pause) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => false,
                    _ = tokio::time::sleep(pause) => true,
                }
            }
        }
    }
}
