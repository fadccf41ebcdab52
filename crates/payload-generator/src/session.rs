//! Generation session state.

use crate::registry::GeneratorRegistry;
use chrono::{NaiveDateTime, TimeDelta};

/// Session-wide fallbacks for temporal helpers that omit their own bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemporalDefaults {
    /// Start instant used when a helper has no `start` argument.
    pub start: Option<NaiveDateTime>,
    /// End instant used when a helper has no `end` argument.
    pub end: Option<NaiveDateTime>,
    /// Fixed step used by sequential helpers when no end bound is known.
    pub interval: Option<TimeDelta>,
}

/// One complete run generating a fixed number of records.
///
/// A session owns the generator registry, so sequential fields continue
/// across every record rendered within it. Build a fresh session per run.
#[derive(Default)]
pub struct GenerationSession {
    registry: GeneratorRegistry,
    total_records: u64,
    temporal: TemporalDefaults,
}

impl GenerationSession {
    /// Create a session targeting `total_records` records.
    pub fn new(total_records: u64) -> Self {
        Self {
            registry: GeneratorRegistry::new(),
            total_records,
            temporal: TemporalDefaults::default(),
        }
    }

    /// Set the temporal fallbacks.
    pub fn with_temporal_defaults(mut self, temporal: TemporalDefaults) -> Self {
        self.temporal = temporal;
        self
    }

    /// Registry of sequential generators for this session.
    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    /// Number of records this session will generate.
    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    /// Temporal fallbacks.
    pub fn temporal_defaults(&self) -> &TemporalDefaults {
        &self.temporal
    }
}
