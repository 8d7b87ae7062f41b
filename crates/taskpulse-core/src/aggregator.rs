//! Aggregator: thread-safe facade over the index, the queue attribution
//! table and the event counters.
//!
//! Design:
//! - One exclusive mutex guards all shared state for the duration of each
//!   public call. Every call is O(1) or O(depth of the task name), with no
//!   I/O and no callbacks under the lock.
//! - Counters belong to the instance. A host that wants process-wide counts
//!   holds one `Aggregator` (typically behind an `Arc`).
//! - Nothing here returns an error. Lost tasks show up as the
//!   [`UNDEFINED`] sentinel in samples.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::{DEFAULT_QUEUE, ExporterConfig};
use crate::domain::{Event, TaskRecord, TaskState};
use crate::index::BoundedTaskIndex;
use crate::machine::{Applied, apply_event};
use crate::routing::{QueueAttribution, RoutingTable};

/// 追跡できなくなったタスクの name / queue に使う値
pub const UNDEFINED: &str = "undefined";

/// TaskSample は 1 イベント分の出力
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSample {
    pub name: String,
    pub state: TaskState,
    pub latency: Option<Duration>,
    pub queue: String,

    /// イベント自身が持つ実行時間
    pub runtime: Option<Duration>,
}

/// ある時点のカウンタ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregatorStats {
    pub event_count: u64,
    pub task_count: u64,
    pub tasks_in_memory: usize,
    pub evicted: u64,
    pub routes: usize,
}

struct AggregatorState {
    index: BoundedTaskIndex,
    attribution: QueueAttribution,

    /// ポーラーが設定する。最初のリフレッシュまでは `None`
    routing: Option<RoutingTable>,

    /// `routing` で解決済みのタスク名。リフレッシュごとにクリア。
    /// それ以外では `attribution` と同様、タスク名の種類数だけ増える。
    resolved: HashMap<String, String>,

    event_count: u64,
    task_count: u64,
}

impl AggregatorState {
    fn record(&mut self, event: &Event) -> bool {
        self.event_count += 1;

        // 不正なイベントはインデックスに触れない（LRU の順序も変えない）
        if event.is_malformed() {
            tracing::warn!(
                task_id = %event.task_id,
                subject = %event.subject,
                "dropping malformed task event"
            );
            return false;
        }

        let existing = self.index.get_mut(&event.task_id);
        match apply_event(existing, event, &mut self.attribution) {
            Applied::Malformed => false,
            Applied::Updated(change) => {
                if change.first_received {
                    self.task_count += 1;
                }
                if let Some(latency) = change.latency {
                    tracing::debug!(task_id = %event.task_id, ?latency, "task left the queue");
                }
                false
            }
            Applied::Created(record, change) => {
                if change.first_received {
                    self.task_count += 1;
                }
                if let Some(evicted) = self.index.put(event.task_id.clone(), record) {
                    tracing::debug!(
                        task_id = %evicted.id,
                        state = %evicted.state,
                        "evicted in-flight task to stay within capacity"
                    );
                }
                tracing::debug!(task_id = %event.task_id, subject = %event.subject, "tracking new task");
                true
            }
        }
    }

    fn sample(
        &mut self,
        name: Option<String>,
        latency: Option<Duration>,
        state: TaskState,
        event: &Event,
        default_queue: &str,
    ) -> TaskSample {
        let name = name.unwrap_or_else(|| UNDEFINED.to_string());
        let queue = self.queue_for(&name, default_queue);
        TaskSample {
            name,
            state,
            latency,
            queue,
            runtime: event.runtime,
        }
    }

    /// attribution を優先し、無ければ routing（名前ごとに 1 回だけ解決）
    fn queue_for(&mut self, name: &str, default_queue: &str) -> String {
        if name == UNDEFINED {
            return UNDEFINED.to_string();
        }
        if let Some(queue) = self.attribution.get(name) {
            return queue.to_string();
        }
        let Some(routing) = &self.routing else {
            return UNDEFINED.to_string();
        };
        self.resolved
            .entry(name.to_string())
            .or_insert_with(|| routing.resolve(name, default_queue))
            .clone()
    }
}

/// Aggregator は集約済みのタスク状態
///
/// 取り込みスレッドと並行する scraper の間で共有できる。
pub struct Aggregator {
    default_queue: String,
    state: Mutex<AggregatorState>,
}

impl Aggregator {
    /// # Panics
    /// Panics if `max_tasks_in_memory` is 0.
    pub fn new(max_tasks_in_memory: usize) -> Self {
        Self::with_default_queue(max_tasks_in_memory, DEFAULT_QUEUE)
    }

    pub fn from_config(config: &ExporterConfig) -> Self {
        Self::with_default_queue(config.max_tasks_in_memory, &config.default_queue)
    }

    fn with_default_queue(max_tasks_in_memory: usize, default_queue: &str) -> Self {
        Self {
            default_queue: default_queue.to_string(),
            state: Mutex::new(AggregatorState {
                index: BoundedTaskIndex::new(max_tasks_in_memory),
                attribution: QueueAttribution::new(),
                routing: None,
                resolved: HashMap::new(),
                event_count: 0,
                task_count: 0,
            }),
        }
    }

    /// イベントを 1 件適用。新しいレコードを作ったかを返す。
    ///
    /// 不正なイベントも `event_count` には数える。
    pub fn record_event(&self, event: &Event) -> bool {
        self.state.lock().record(event)
    }

    /// 終端イベントを報告し、タスクを忘れる。
    ///
    /// `None` を返すのは subject が未知のときだけ。
    pub fn collect(&self, event: &Event) -> Option<TaskSample> {
        let state = event.subject.task_state()?;
        let mut guard = self.state.lock();
        let (name, latency) = guard
            .index
            .remove(&event.task_id)
            .map(|record| (record.name, record.latency))
            .unwrap_or_default();
        Some(guard.sample(name, latency, state, event, &self.default_queue))
    }

    /// 非終端イベントを報告（タスクは保持）
    pub fn observe(&self, event: &Event) -> Option<TaskSample> {
        let state = event.subject.task_state()?;
        let mut guard = self.state.lock();
        let (name, latency) = guard
            .index
            .peek(&event.task_id)
            .map(|record| (record.name.clone(), record.latency))
            .unwrap_or_default();
        Some(guard.sample(name, latency, state, event, &self.default_queue))
    }

    /// `record_event` followed by `collect` or `observe` under one lock, so a
    /// terminal record is read and evicted in the same step it is updated.
    /// Malformed events are counted and yield `None`.
    pub fn ingest(&self, event: &Event) -> Option<TaskSample> {
        let mut guard = self.state.lock();
        guard.record(event);
        if event.is_malformed() {
            return None;
        }
        let state = event.subject.task_state()?;

        let (name, latency) = if state.is_terminal() {
            guard
                .index
                .remove(&event.task_id)
                .map(|record| (record.name, record.latency))
                .unwrap_or_default()
        } else {
            guard
                .index
                .peek(&event.task_id)
                .map(|record| (record.name.clone(), record.latency))
                .unwrap_or_default()
        };
        Some(guard.sample(name, latency, state, event, &self.default_queue))
    }

    /// ルーティングのスナップショットを差し替える。
    /// 解決済みの名前は次の利用時に再解決される。
    pub fn set_routing(&self, routing: RoutingTable) {
        let mut guard = self.state.lock();
        guard.routing = Some(routing);
        guard.resolved.clear();
    }

    /// `task_id` の現在のレコードのコピー（使用順は変えない）
    pub fn task(&self, task_id: &str) -> Option<TaskRecord> {
        self.state.lock().index.peek(task_id).cloned()
    }

    pub fn event_count(&self) -> u64 {
        self.state.lock().event_count
    }

    pub fn task_count(&self) -> u64 {
        self.state.lock().task_count
    }

    pub fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().index.is_empty()
    }

    pub fn stats(&self) -> AggregatorStats {
        let guard = self.state.lock();
        AggregatorStats {
            event_count: guard.event_count,
            task_count: guard.task_count,
            tasks_in_memory: guard.index.len(),
            evicted: guard.index.evictions(),
            routes: guard.routing.as_ref().map_or(0, RoutingTable::len),
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::from_config(&ExporterConfig::default())
    }
}
