//! Error types for payload generation.

use thiserror::Error;

/// Errors that can occur while building a renderer or rendering a record.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// The payload template could not be read.
    #[error("Failed to read template {path}: {source}")]
    TemplateRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The payload template could not be compiled.
    #[error("Template error: {0}")]
    Template(String),

    /// A single record failed to render.
    #[error("Render error: {0}")]
    Render(String),

    /// A helper argument could not be interpreted.
    #[error("Invalid argument '{argument}' for {helper}: {reason}")]
    InvalidArgument {
        helper: &'static str,
        argument: &'static str,
        reason: String,
    },

    /// The same identifier was used for two different kinds of sequence.
    #[error("Sequence '{id}' is a {existing} sequence, cannot use it as {requested}")]
    KindMismatch {
        id: String,
        existing: &'static str,
        requested: &'static str,
    },

    /// A temporal sequence needs a positive number of records to divide its range.
    #[error("Temporal sequence needs at least one record")]
    EmptySession,

    /// A sequence lock was poisoned by a panicking renderer.
    #[error("Sequence '{0}' is poisoned")]
    Poisoned(String),
}
