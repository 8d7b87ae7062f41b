//! Worker lifecycle events (online / heartbeat / offline).

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default heartbeat interval announced by workers.
pub const DEFAULT_HEARTBEAT_FREQ: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEventKind {
    Online,
    Heartbeat,
    Offline,
}

impl WorkerEventKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "worker-online" => Some(WorkerEventKind::Online),
            "worker-heartbeat" => Some(WorkerEventKind::Heartbeat),
            "worker-offline" => Some(WorkerEventKind::Offline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerEvent {
    pub hostname: String,
    pub kind: WorkerEventKind,
    pub timestamp: DateTime<Utc>,

    /// Heartbeat interval the worker announced.
    pub freq: Duration,
}

impl WorkerEvent {
    pub fn new(hostname: impl Into<String>, kind: WorkerEventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            hostname: hostname.into(),
            kind,
            timestamp,
            freq: DEFAULT_HEARTBEAT_FREQ,
        }
    }

    pub fn with_freq(mut self, freq: Duration) -> Self {
        self.freq = freq;
        self
    }
}
