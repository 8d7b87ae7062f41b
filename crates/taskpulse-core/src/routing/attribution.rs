//! Queue attribution learned from events.

use std::collections::HashMap;

/// `task name → queue`, seeded by the first event that names a queue.
///
/// Entries are never overwritten: a task name's queue binding is assumed
/// stable for the life of the process.
#[derive(Debug, Default)]
pub struct QueueAttribution {
    queues: HashMap<String, String>,
}

impl QueueAttribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `name → queue` if `name` has no entry yet. Returns whether it did.
    pub fn seed(&mut self, name: &str, queue: &str) -> bool {
        if name.is_empty() || queue.is_empty() || self.queues.contains_key(name) {
            return false;
        }
        self.queues.insert(name.to_string(), queue.to_string());
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.queues.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
