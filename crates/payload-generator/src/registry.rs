//! Per-session registry of sequential generators.
//!
//! The registry maps a caller-chosen identifier to exactly one generator.
//! Bounds are fixed by whichever call creates the generator; later calls with
//! the same identifier continue that sequence and ignore their own bounds.
//!
//! Each generator sits behind its own mutex so concurrent renderers never
//! observe the same step twice. The map lock is held only for lookup and
//! creation.

use crate::error::GeneratorError;
use crate::generators::{Sequence, SequenceNumber, SequentialNumeric, SequentialTemporal};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared, exclusively-locked handle to a registered generator.
pub type GeneratorHandle<G> = Arc<Mutex<G>>;

/// Generators that can be stored in a [`GeneratorRegistry`].
pub trait Registrable: Send + 'static {
    /// Kind name; one identifier can only ever hold one kind.
    const KIND: &'static str;
}

impl<T: SequenceNumber> Registrable for SequentialNumeric<T> {
    const KIND: &'static str = T::KIND;
}

impl Registrable for SequentialTemporal {
    const KIND: &'static str = "temporal";
}

struct Entry {
    kind: &'static str,
    handle: Arc<dyn Any + Send + Sync>,
}

/// Identifier to generator map for one generation session.
#[derive(Default)]
pub struct GeneratorRegistry {
    entries: Mutex<HashMap<String, Entry>>,
}

impl GeneratorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the generator registered under `id`, creating it with `factory`
    /// on first use.
    ///
    /// `factory` is only invoked when `id` is absent. Requesting an existing
    /// identifier as a different kind of generator fails with
    /// [`GeneratorError::KindMismatch`].
    pub fn get_or_create<G, F>(&self, id: &str, factory: F) -> Result<GeneratorHandle<G>, GeneratorError>
    where
        G: Registrable,
        F: FnOnce() -> Result<G, GeneratorError>,
    {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| GeneratorError::Poisoned(id.to_string()))?;

        if let Some(entry) = entries.get(id) {
            let mismatch = || GeneratorError::KindMismatch {
                id: id.to_string(),
                existing: entry.kind,
                requested: G::KIND,
            };
            if entry.kind != G::KIND {
                return Err(mismatch());
            }
            return entry
                .handle
                .clone()
                .downcast::<Mutex<G>>()
                .map_err(|_| mismatch());
        }

        let handle: GeneratorHandle<G> = Arc::new(Mutex::new(factory()?));
        tracing::debug!("Registered {} sequence '{}'", G::KIND, id);
        entries.insert(
            id.to_string(),
            Entry {
                kind: G::KIND,
                handle: handle.clone(),
            },
        );
        Ok(handle)
    }

    /// Advance the generator registered under `id`, creating it first if needed.
    pub fn next_value<G, F>(&self, id: &str, factory: F) -> Result<G::Value, GeneratorError>
    where
        G: Registrable + Sequence,
        F: FnOnce() -> Result<G, GeneratorError>,
    {
        let handle = self.get_or_create(id, factory)?;
        let mut generator = handle
            .lock()
            .map_err(|_| GeneratorError::Poisoned(id.to_string()))?;
        Ok(generator.next_value())
    }

    /// Number of registered generators.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Whether no generator has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let registry = GeneratorRegistry::new();
        let mut second_factory_invoked = false;

        let first = registry
            .get_or_create("x", || Ok(SequentialNumeric::new(0i64, 10, 1)))
            .unwrap();
        let second = registry
            .get_or_create("x", || {
                second_factory_invoked = true;
                Ok(SequentialNumeric::new(100i64, 200, 5))
            })
            .unwrap();

        assert!(!second_factory_invoked);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.lock().unwrap().min(), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_later_bounds_are_ignored() {
        let registry = GeneratorRegistry::new();

        let a = registry
            .next_value("seq", || Ok(SequentialNumeric::new(0, 10, 2)))
            .unwrap();
        let b = registry
            .next_value("seq", || Ok(SequentialNumeric::new(50, 60, 1)))
            .unwrap();

        assert_eq!((a, b), (0, 2));
    }

    #[test]
    fn test_kind_mismatch_is_an_error() {
        let registry = GeneratorRegistry::new();
        registry
            .get_or_create("shared", || Ok(SequentialNumeric::new(0i32, 10, 1)))
            .unwrap();

        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let result = registry.get_or_create("shared", || {
            Ok(SequentialTemporal::with_interval(start, TimeDelta::seconds(1)))
        });
        assert!(matches!(
            result,
            Err(GeneratorError::KindMismatch {
                existing: "int",
                requested: "temporal",
                ..
            })
        ));

        let result = registry.get_or_create("shared", || Ok(SequentialNumeric::new(0i64, 10, 1)));
        assert!(matches!(result, Err(GeneratorError::KindMismatch { .. })));
    }

    #[test]
    fn test_factory_error_does_not_register() {
        let registry = GeneratorRegistry::new();
        let result: Result<GeneratorHandle<SequentialTemporal>, _> =
            registry.get_or_create("t", || Err(GeneratorError::EmptySession));

        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_next_never_repeats() {
        let registry = Arc::new(GeneratorRegistry::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    (0..500)
                        .map(|_| {
                            registry
                                .next_value("counter", || {
                                    Ok(SequentialNumeric::new(0i64, i64::MAX, 1))
                                })
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in threads {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value), "value {value} observed twice");
            }
        }
        assert_eq!(seen.len(), 4000);
        assert_eq!(seen.iter().max(), Some(&3999));
    }
}
