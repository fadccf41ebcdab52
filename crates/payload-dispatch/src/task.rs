//! Unit of work handed from generation to dispatch.

use std::sync::Arc;

/// One rendered payload bound for a topic.
///
/// Ownership moves from the generator into the queue and then to exactly one
/// worker; the topic name is shared across all tasks of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTask {
    pub topic: Arc<str>,
    pub payload: String,
}

impl DispatchTask {
    pub fn new(topic: Arc<str>, payload: String) -> Self {
        Self { topic, payload }
    }
}
