//! Task lifecycle events.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::TaskState;

/// Subject of a task event (`task-sent`, `task-received`, ...).
///
/// Every known subject maps to exactly one [`TaskState`]. Subjects the
/// aggregator does not understand decode to `Unknown` so they can still be
/// counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSubject {
    Sent,
    Received,
    Started,
    Succeeded,
    Failed,
    Retried,
    Revoked,
    Unknown,
}

impl EventSubject {
    /// Parse a subject with or without the `task-` prefix.
    pub fn parse(subject: &str) -> Self {
        match subject.strip_prefix("task-").unwrap_or(subject) {
            "sent" => EventSubject::Sent,
            "received" => EventSubject::Received,
            "started" => EventSubject::Started,
            "succeeded" => EventSubject::Succeeded,
            "failed" => EventSubject::Failed,
            "retried" => EventSubject::Retried,
            "revoked" => EventSubject::Revoked,
            _ => EventSubject::Unknown,
        }
    }

    /// The state a task enters when this event is applied.
    pub fn task_state(self) -> Option<TaskState> {
        match self {
            EventSubject::Sent => Some(TaskState::Sent),
            EventSubject::Received => Some(TaskState::Received),
            EventSubject::Started => Some(TaskState::Started),
            EventSubject::Succeeded => Some(TaskState::Succeeded),
            EventSubject::Failed => Some(TaskState::Failed),
            EventSubject::Retried => Some(TaskState::Retried),
            EventSubject::Revoked => Some(TaskState::Revoked),
            EventSubject::Unknown => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventSubject::Sent => "task-sent",
            EventSubject::Received => "task-received",
            EventSubject::Started => "task-started",
            EventSubject::Succeeded => "task-succeeded",
            EventSubject::Failed => "task-failed",
            EventSubject::Retried => "task-retried",
            EventSubject::Revoked => "task-revoked",
            EventSubject::Unknown => "task-unknown",
        }
    }
}

impl fmt::Display for EventSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle notification about one task instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub task_id: String,
    pub subject: EventSubject,

    /// When the event was emitted (producer clock).
    pub timestamp: DateTime<Utc>,

    /// When the event consumer received it (local clock).
    /// Latency is computed from this field only.
    pub local_received_at: DateTime<Utc>,

    /// Logical clock of the message bus, diagnostics only.
    pub clock: u64,

    /// Host that emitted the event.
    pub hostname: String,

    pub queue: Option<String>,
    pub task_name: Option<String>,

    /// Execution time, present on terminal events.
    pub runtime: Option<Duration>,
}

impl Event {
    /// Create an event with both timestamps set to `at`.
    pub fn new(task_id: impl Into<String>, subject: EventSubject, at: DateTime<Utc>) -> Self {
        Self {
            task_id: task_id.into(),
            subject,
            timestamp: at,
            local_received_at: at,
            clock: 0,
            hostname: String::new(),
            queue: None,
            task_name: None,
            runtime: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = Some(name.into());
        self
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_runtime(mut self, runtime: Duration) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_local_received_at(mut self, at: DateTime<Utc>) -> Self {
        self.local_received_at = at;
        self
    }

    pub fn with_clock(mut self, clock: u64) -> Self {
        self.clock = clock;
        self
    }

    /// Events without a task id or with an unknown subject change no state.
    pub fn is_malformed(&self) -> bool {
        self.task_id.is_empty() || self.subject.task_state().is_none()
    }
}
