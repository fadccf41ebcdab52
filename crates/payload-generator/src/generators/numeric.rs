//! Numeric value generators.
//!
//! [`SequentialNumeric`] produces a cyclic arithmetic progression bounded by
//! `[min, max]`. The free functions draw independent random values and keep
//! no state between calls.

use super::Sequence;
use rand::distr::uniform::SampleUniform;
use rand::Rng;
use std::fmt;

/// Numeric types a [`SequentialNumeric`] can step through.
pub trait SequenceNumber: Copy + PartialOrd + fmt::Display + fmt::Debug + Send + 'static {
    /// Additive identity, used to tell ascending from descending sequences.
    const ZERO: Self;

    /// Name used when reporting identifier clashes in the registry.
    const KIND: &'static str;

    /// `self + increment`, or `None` when the result is not representable.
    fn step(self, increment: Self) -> Option<Self>;
}

impl SequenceNumber for i32 {
    const ZERO: Self = 0;
    const KIND: &'static str = "int";

    fn step(self, increment: Self) -> Option<Self> {
        self.checked_add(increment)
    }
}

impl SequenceNumber for i64 {
    const ZERO: Self = 0;
    const KIND: &'static str = "long";

    fn step(self, increment: Self) -> Option<Self> {
        self.checked_add(increment)
    }
}

impl SequenceNumber for f64 {
    const ZERO: Self = 0.0;
    const KIND: &'static str = "double";

    fn step(self, increment: Self) -> Option<Self> {
        Some(self + increment).filter(|next| next.is_finite())
    }
}

/// A bounded, cyclic arithmetic progression.
///
/// Ascending sequences start at `min` and wrap back to `min` once the next
/// step would leave `[min, max]`. Descending sequences (negative increment)
/// mirror this: they start at `max` and wrap back to `max`.
#[derive(Debug, Clone, PartialEq)]
pub struct SequentialNumeric<T> {
    min: T,
    max: T,
    increment: T,
    current: T,
}

impl<T: SequenceNumber> SequentialNumeric<T> {
    /// Create a sequence over `[min, max]`. Reversed bounds are swapped.
    pub fn new(min: T, max: T, increment: T) -> Self {
        let (min, max) = if max < min { (max, min) } else { (min, max) };
        let current = if increment < T::ZERO { max } else { min };
        Self {
            min,
            max,
            increment,
            current,
        }
    }

    /// Lower bound of the sequence.
    pub fn min(&self) -> T {
        self.min
    }

    /// Upper bound of the sequence.
    pub fn max(&self) -> T {
        self.max
    }

    /// The value the next call to [`Sequence::next_value`] will return.
    pub fn peek(&self) -> T {
        self.current
    }
}

impl<T: SequenceNumber> Sequence for SequentialNumeric<T> {
    type Value = T;

    fn next_value(&mut self) -> T {
        let value = self.current;
        self.current = match value.step(self.increment) {
            Some(next) if next >= self.min && next <= self.max => next,
            _ if self.increment < T::ZERO => self.max,
            _ => self.min,
        };
        value
    }
}

/// Draw a random value in `[min, max]`.
///
/// Callers must ensure `min <= max`.
pub fn random_in_range<T, R>(rng: &mut R, min: T, max: T) -> T
where
    T: SampleUniform + PartialOrd,
    R: Rng + ?Sized,
{
    rng.random_range(min..=max)
}

/// Draw a random double in `[min, max]`, rounded to two decimal places.
pub fn random_double<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    let value: f64 = rng.random_range(min..=max);
    ((value * 100.0).round() / 100.0).clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn take<T: SequenceNumber>(seq: &mut SequentialNumeric<T>, n: usize) -> Vec<T> {
        (0..n).map(|_| seq.next_value()).collect()
    }

    #[test]
    fn test_wraps_after_reaching_max() {
        let mut seq = SequentialNumeric::new(0, 10, 2);
        assert_eq!(take(&mut seq, 8), vec![0, 2, 4, 6, 8, 10, 0, 2]);
    }

    #[test]
    fn test_first_value_is_min() {
        let mut seq = SequentialNumeric::new(5i64, 100, 7);
        assert_eq!(seq.next_value(), 5);
    }

    #[test]
    fn test_wraps_when_step_overshoots_max() {
        let mut seq = SequentialNumeric::new(0, 9, 2);
        assert_eq!(take(&mut seq, 7), vec![0, 2, 4, 6, 8, 0, 2]);
    }

    #[test]
    fn test_values_stay_within_bounds() {
        let mut seq = SequentialNumeric::new(-3, 4, 3);
        for value in take(&mut seq, 50) {
            assert!((-3..=4).contains(&value));
        }
    }

    #[test]
    fn test_descending_sequence_starts_at_max() {
        let mut seq = SequentialNumeric::new(0, 6, -2);
        assert_eq!(take(&mut seq, 6), vec![6, 4, 2, 0, 6, 4]);
    }

    #[test]
    fn test_zero_increment_is_constant() {
        let mut seq = SequentialNumeric::new(3, 9, 0);
        assert_eq!(take(&mut seq, 3), vec![3, 3, 3]);
    }

    #[test]
    fn test_swapped_bounds_are_normalised() {
        let seq = SequentialNumeric::new(10, 0, 1);
        assert_eq!(seq.min(), 0);
        assert_eq!(seq.max(), 10);
        assert_eq!(seq.peek(), 0);
    }

    #[test]
    fn test_overflow_wraps_instead_of_panicking() {
        let mut seq = SequentialNumeric::new(i32::MAX - 1, i32::MAX, 5);
        assert_eq!(take(&mut seq, 3), vec![i32::MAX - 1, i32::MAX - 1, i32::MAX - 1]);

        let mut seq = SequentialNumeric::new(i32::MAX - 2, i32::MAX, 1);
        assert_eq!(
            take(&mut seq, 4),
            vec![i32::MAX - 2, i32::MAX - 1, i32::MAX, i32::MAX - 2]
        );
    }

    #[test]
    fn test_floating_increment() {
        let mut seq = SequentialNumeric::new(0.0, 1.0, 0.5);
        assert_eq!(take(&mut seq, 4), vec![0.0, 0.5, 1.0, 0.0]);
    }

    #[test]
    fn test_random_in_range() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let value = random_in_range(&mut rng, 10i64, 20);
            assert!((10..=20).contains(&value));
        }
    }

    #[test]
    fn test_random_double_has_two_decimals() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let value = random_double(&mut rng, 0.0, 100.0);
            assert!((0.0..=100.0).contains(&value));
            assert_eq!((value * 100.0).round() / 100.0, value);
        }
    }
}
