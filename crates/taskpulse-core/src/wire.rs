//! Wire decoding of JSON events.
//!
//! Events arrive in the task-queue system's native shape:
//!
//! ```json
//! {"type": "task-received", "uuid": "...", "name": "app.add",
//!  "timestamp": 1714564800.25, "local_received": 1714564800.31,
//!  "clock": 42, "hostname": "worker-1", "queue": "default"}
//! ```
//!
//! Timestamps are fractional seconds since the Unix epoch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::worker::DEFAULT_HEARTBEAT_FREQ;
use crate::domain::{DecodeError, Event, EventSubject, WorkerEvent, WorkerEventKind};

/// WireEvent はデコード済みのイベント
#[derive(Debug, Clone, PartialEq)]
pub enum WireEvent {
    Task(Event),
    Worker(WorkerEvent),

    /// 形式は正しいが集約には無関係（`type` を保持）
    Ignored(String),
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    timestamp: Option<f64>,
    #[serde(default)]
    local_received: Option<f64>,
    #[serde(default)]
    clock: Option<u64>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    queue: Option<String>,
    #[serde(default)]
    runtime: Option<f64>,
    #[serde(default)]
    freq: Option<f64>,
}

/// JSON イベントを 1 件デコード
pub fn decode(line: &str) -> Result<WireEvent, DecodeError> {
    let raw: RawEvent = serde_json::from_str(line)?;

    if let Some(subject) = raw.kind.strip_prefix("task-") {
        return decode_task(EventSubject::parse(subject), raw).map(WireEvent::Task);
    }
    if let Some(kind) = WorkerEventKind::parse(&raw.kind) {
        return decode_worker(kind, raw).map(WireEvent::Worker);
    }
    Ok(WireEvent::Ignored(raw.kind))
}

fn decode_task(subject: EventSubject, raw: RawEvent) -> Result<Event, DecodeError> {
    let timestamp = epoch(raw.timestamp.ok_or(DecodeError::MissingField("timestamp"))?)?;
    let local_received_at = match raw.local_received {
        Some(secs) => epoch(secs)?,
        None => timestamp,
    };

    Ok(Event {
        task_id: raw.uuid.unwrap_or_default(),
        subject,
        timestamp,
        local_received_at,
        clock: raw.clock.unwrap_or_default(),
        hostname: raw.hostname.unwrap_or_default(),
        queue: raw.queue.filter(|q| !q.is_empty()),
        task_name: raw.name.filter(|n| !n.is_empty()),
        runtime: raw.runtime.and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
    })
}

fn decode_worker(kind: WorkerEventKind, raw: RawEvent) -> Result<WorkerEvent, DecodeError> {
    let timestamp = epoch(raw.timestamp.ok_or(DecodeError::MissingField("timestamp"))?)?;
    let hostname = raw.hostname.ok_or(DecodeError::MissingField("hostname"))?;
    let freq = raw
        .freq
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .filter(|freq| !freq.is_zero())
        .unwrap_or(DEFAULT_HEARTBEAT_FREQ);

    Ok(WorkerEvent::new(hostname, kind, timestamp).with_freq(freq))
}

fn epoch(secs: f64) -> Result<DateTime<Utc>, DecodeError> {
    if !secs.is_finite() {
        return Err(DecodeError::InvalidTimestamp(secs));
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos).ok_or(DecodeError::InvalidTimestamp(secs))
}
