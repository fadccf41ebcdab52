//! Template-driven payload generation for kafka-workload-generator.
//!
//! A payload template is a Handlebars document whose values come from helper
//! calls rather than from a data context:
//!
//! ```text
//! {
//!   "orderId": {{fake-long sequential=true min=1 max=1000000 id="order"}},
//!   "customer": "{{fake-fullName}}",
//!   "status": "{{oneof "NEW" "PAID" "SHIPPED"}}",
//!   "createdAt": "{{fake-datetime sequential=true start="01-01-2024T00:00:00" end="31-01-2024T00:00:00"}}"
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! GenerationSession ──owns──▶ GeneratorRegistry { id → SequentialNumeric | SequentialTemporal }
//!        ▲
//!        │ shared (Arc)
//!        │
//! PayloadRenderer (Handlebars + helpers) ◀── PayloadGenerator ──▶ emit(String)
//! ```
//!
//! Helpers called with `sequential=true` advance a generator in the session
//! registry, keyed by `id` (or by the helper name when `id` is omitted). All
//! other helper calls are independent random draws.
//!
//! # Helpers
//!
//! - `fake-int`, `fake-long`, `fake-double` - `min`, `max`, `sequential`, `increment`, `id`
//! - `fake-date` (`dd-MM-yyyy` bounds), `fake-datetime` (`dd-MM-yyyy'T'HH:mm:ss` bounds) -
//!   `start`, `end`, `interval` (seconds), `format`, `sequential`, `id`
//! - `fake-uuid`, `fake-firstName`, `fake-lastName`, `fake-fullName`
//! - `oneof` - picks one of its positional parameters

pub mod error;
pub mod generator;
pub mod generators;
pub mod helpers;
pub mod registry;
pub mod renderer;
pub mod session;

pub use error::GeneratorError;
pub use generator::{GenerationReport, PayloadGenerator, PayloadIterator};
pub use generators::timestamp::parse_datetime;
pub use registry::{GeneratorHandle, GeneratorRegistry};
pub use renderer::PayloadRenderer;
pub use session::{GenerationSession, TemporalDefaults};
