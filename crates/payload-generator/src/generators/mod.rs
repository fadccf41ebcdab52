//! Individual value generators.
//!
//! Sequential generators ([`SequentialNumeric`], [`SequentialTemporal`]) are
//! stateful and live in the session registry. Everything else in this module
//! is a stateless random draw.

pub mod choice;
pub mod name;
pub mod numeric;
pub mod timestamp;
pub mod uuid;

pub use numeric::{SequenceNumber, SequentialNumeric};
pub use timestamp::SequentialTemporal;

/// A deterministic state machine producing the next value of a field.
pub trait Sequence {
    /// The value type produced on each step.
    type Value;

    /// Advance the sequence and return the value for this call.
    fn next_value(&mut self) -> Self::Value;
}
