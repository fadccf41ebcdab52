//! Record generation loop.

use crate::error::GeneratorError;
use crate::renderer::PayloadRenderer;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Counts from one generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Records rendered and handed to the consumer.
    pub rendered: u64,
    /// Records skipped because rendering failed.
    pub failed: u64,
    /// Whether the consumer asked to stop before `count` was reached.
    pub stopped_early: bool,
    pub duration: Duration,
}

impl GenerationReport {
    /// Fold another pass (e.g. from a sibling thread) into this one.
    pub fn merge(&mut self, other: &GenerationReport) {
        self.rendered += other.rendered;
        self.failed += other.failed;
        self.stopped_early |= other.stopped_early;
        self.duration = self.duration.max(other.duration);
    }
}

/// Renders a fixed number of records from a shared [`PayloadRenderer`].
#[derive(Clone)]
pub struct PayloadGenerator {
    renderer: Arc<PayloadRenderer>,
}

impl PayloadGenerator {
    pub fn new(renderer: Arc<PayloadRenderer>) -> Self {
        Self { renderer }
    }

    /// Lazily render `count` records.
    pub fn payloads(&self, count: u64) -> PayloadIterator<'_> {
        PayloadIterator {
            renderer: &self.renderer,
            remaining: count,
        }
    }

    /// Render `count` records, passing each successful payload to `emit`.
    ///
    /// A record that fails to render is logged and skipped. `emit` returning
    /// [`ControlFlow::Break`] stops generation (for example when the consumer
    /// has gone away).
    pub fn generate<F>(&self, count: u64, mut emit: F) -> GenerationReport
    where
        F: FnMut(String) -> ControlFlow<()>,
    {
        let start = Instant::now();
        let mut report = GenerationReport::default();

        for (index, payload) in self.payloads(count).enumerate() {
            match payload {
                Ok(payload) => {
                    report.rendered += 1;
                    if emit(payload).is_break() {
                        debug!("Generation stopped after {} records", report.rendered);
                        report.stopped_early = true;
                        break;
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    warn!("Skipping record {}: {}", index, e);
                }
            }
        }

        report.duration = start.elapsed();
        report
    }
}

/// Iterator that lazily renders payloads.
pub struct PayloadIterator<'a> {
    renderer: &'a PayloadRenderer,
    remaining: u64,
}

impl Iterator for PayloadIterator<'_> {
    type Item = Result<String, GeneratorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.renderer.render())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PayloadIterator<'_> {}
