//! Timestamp value generators.

use super::Sequence;
use crate::error::GeneratorError;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Utc};
use rand::Rng;

/// Input format for `fake-date` bounds (`dd-MM-yyyy`).
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Input format for `fake-datetime` bounds and the session timestamp options
/// (`dd-MM-yyyy'T'HH:mm:ss`).
pub const DATETIME_FORMAT: &str = "%d-%m-%YT%H:%M:%S";

/// A monotonic progression of timestamps.
///
/// Each call to [`Sequence::next_value`] advances the cursor by one step and
/// returns the new position, so the k-th value is `start + k * step`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequentialTemporal {
    cursor: NaiveDateTime,
    step: TimeDelta,
}

impl SequentialTemporal {
    /// Spread `total_records` steps evenly across `[start, end]`.
    pub fn bounded(
        start: NaiveDateTime,
        end: NaiveDateTime,
        total_records: u64,
    ) -> Result<Self, GeneratorError> {
        if total_records == 0 {
            return Err(GeneratorError::EmptySession);
        }
        let divisor = i64::try_from(total_records).unwrap_or(i64::MAX);
        let span = end - start;
        let step = match span.num_nanoseconds() {
            Some(nanos) => TimeDelta::nanoseconds(nanos / divisor),
            None => TimeDelta::milliseconds(span.num_milliseconds() / divisor),
        };
        Ok(Self::with_interval(start, step))
    }

    /// Advance by a fixed `interval` on every call.
    pub fn with_interval(start: NaiveDateTime, interval: TimeDelta) -> Self {
        Self {
            cursor: start,
            step: interval,
        }
    }

    /// Distance between two consecutive values.
    pub fn step(&self) -> TimeDelta {
        self.step
    }
}

impl Sequence for SequentialTemporal {
    type Value = NaiveDateTime;

    fn next_value(&mut self) -> NaiveDateTime {
        // Out-of-range timestamps pin the cursor at its last valid position.
        if let Some(next) = self.cursor.checked_add_signed(self.step) {
            self.cursor = next;
        }
        self.cursor
    }
}

/// Current UTC time without timezone information.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Draw a random timestamp in `[start, end]` with millisecond resolution.
///
/// A reversed or empty range returns `start`.
pub fn random_between<R: Rng + ?Sized>(
    rng: &mut R,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> NaiveDateTime {
    let span = (end - start).num_milliseconds();
    if span <= 0 {
        return start;
    }
    let offset = rng.random_range(0..=span);
    start
        .checked_add_signed(TimeDelta::milliseconds(offset))
        .unwrap_or(start)
}

/// Parse a `fake-date` bound, falling back to ISO 8601 (`yyyy-MM-dd`).
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    [DATE_FORMAT, "%Y-%m-%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Parse a `fake-datetime` bound, falling back to ISO 8601 and RFC 3339.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Some(dt) = [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Some(dt);
    }
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc())
}
