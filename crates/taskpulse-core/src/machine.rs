//! Event state machine: applies one event to one task record.
//!
//! The machine is a pure function of (previous record, event). It never
//! rejects a transition; it only decides which fields the event may fill in
//! and whether a latency sample can be derived.

use std::time::Duration;

use crate::domain::{Event, EventSubject, TaskRecord, TaskState};
use crate::routing::QueueAttribution;

/// Change はイベント適用で得られた事実
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Change {
    /// キュー滞在時間（`received` 直後の `started` のときだけ）
    pub latency: Option<Duration>,

    /// 初めて `received` を受け取った
    pub first_received: bool,
}

/// Applied は [`apply_event`] の結果
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// task id なし、または未知の subject。何も変更しない
    Malformed,

    /// 既存レコードをその場で更新
    Updated(Change),

    /// レコードが無かった。新しいレコードは呼び出し側が保存する
    Created(TaskRecord, Change),
}

/// `event` を `existing` に適用する。無ければ新しいレコードを作る。
///
/// イベントの queue はレコード名に対して `attribution` へ登録される
/// （first writer wins）。
pub fn apply_event(
    existing: Option<&mut TaskRecord>,
    event: &Event,
    attribution: &mut QueueAttribution,
) -> Applied {
    if event.task_id.is_empty() {
        return Applied::Malformed;
    }
    let Some(state) = event.subject.task_state() else {
        return Applied::Malformed;
    };

    match existing {
        Some(record) => {
            let previous = Some(record.state);
            Applied::Updated(transition(record, previous, state, event, attribution))
        }
        None => {
            let mut record = TaskRecord::new(event.task_id.clone(), state);
            let change = transition(&mut record, None, state, event, attribution);
            Applied::Created(record, change)
        }
    }
}

fn transition(
    record: &mut TaskRecord,
    previous: Option<TaskState>,
    state: TaskState,
    event: &Event,
    attribution: &mut QueueAttribution,
) -> Change {
    let mut change = Change::default();

    if event.subject == EventSubject::Started {
        change.latency = queue_latency(record, previous, event);
        record.latency = change.latency;
    }

    record.state = state;
    record.clock = event.clock;

    match event.subject {
        EventSubject::Sent => record.adopt_client_host(&event.hostname),
        EventSubject::Received => {
            change.first_received = record.mark_received(event.timestamp, event.local_received_at);
        }
        _ => {}
    }

    record.adopt_name(event.task_name.as_deref());

    if let (Some(name), Some(queue)) = (record.name.as_deref(), event.queue.as_deref()) {
        attribution.seed(name, queue);
    }

    change
}

/// `started.local_received_at - received.local_received_at`, defined only when
/// the previous state was exactly `Received`. Lost events or clock skew
/// (negative difference) yield `None`.
fn queue_latency(record: &TaskRecord, previous: Option<TaskState>, event: &Event) -> Option<Duration> {
    if previous != Some(TaskState::Received) {
        return None;
    }
    let received = record.local_received_at?;
    match (event.local_received_at - received).to_std() {
        Ok(latency) => Some(latency),
        Err(_) => {
            tracing::debug!(
                task_id = %record.id,
                "started before received on the local clock, skipping latency"
            );
            None
        }
    }
}
