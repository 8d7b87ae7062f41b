//! Task record: latest known state of one task instance.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::TaskState;

/// Latest known state of one task instance.
///
/// Design:
/// - Owned by the bounded index; callers get clones.
/// - `id` never changes, `name` and `client_host` are written at most once.
/// - `state` changes on every event.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub id: String,
    pub name: Option<String>,

    /// Origin host of the `sent` event.
    pub client_host: Option<String>,

    pub state: TaskState,

    /// Timestamps of the first `received` event.
    pub received_at: Option<DateTime<Utc>>,
    pub local_received_at: Option<DateTime<Utc>>,

    /// Logical clock of the last applied event.
    pub clock: u64,

    /// Time in queue measured at the most recent `started` event.
    pub latency: Option<Duration>,
}

impl TaskRecord {
    pub fn new(id: impl Into<String>, state: TaskState) -> Self {
        Self {
            id: id.into(),
            name: None,
            client_host: None,
            state,
            received_at: None,
            local_received_at: None,
            clock: 0,
            latency: None,
        }
    }

    /// Set the name unless one is already known. Empty names are ignored.
    pub fn adopt_name(&mut self, name: Option<&str>) {
        if self.name.is_some() {
            return;
        }
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            self.name = Some(name.to_string());
        }
    }

    /// Set the client host unless one is already known.
    pub fn adopt_client_host(&mut self, host: &str) {
        if self.client_host.is_none() && !host.is_empty() {
            self.client_host = Some(host.to_string());
        }
    }

    /// Record the first receive. Returns `false` if already received.
    pub fn mark_received(&mut self, at: DateTime<Utc>, local_at: DateTime<Utc>) -> bool {
        if self.received_at.is_some() || self.local_received_at.is_some() {
            return false;
        }
        self.received_at = Some(at);
        self.local_received_at = Some(local_at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_set_once() {
        let mut record = TaskRecord::new("t1", TaskState::Sent);
        record.adopt_name(Some(""));
        assert_eq!(record.name, None);

        record.adopt_name(Some("billing.charge"));
        record.adopt_name(Some("billing.refund"));
        assert_eq!(record.name.as_deref(), Some("billing.charge"));
    }

    #[test]
    fn received_timestamps_are_kept_from_first_receive() {
        let first = Utc::now();
        let later = first + chrono::Duration::seconds(3);
        let mut record = TaskRecord::new("t1", TaskState::Received);

        assert!(record.mark_received(first, first));
        assert!(!record.mark_received(later, later));
        assert_eq!(record.local_received_at, Some(first));
    }
}
