//! Metrics export through the `metrics` facade.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `taskpulse_tasks_total` | Counter | name, state, queue, namespace |
//! | `taskpulse_task_runtime_seconds` | Histogram | name, queue, namespace |
//! | `taskpulse_task_latency_seconds` | Histogram | name, queue, namespace |
//! | `taskpulse_workers` | Gauge | namespace |
//! | `taskpulse_events_total` | Counter | namespace |
//! | `taskpulse_evicted_tasks_total` | Counter | namespace |
//! | `taskpulse_tasks_in_memory` | Gauge | namespace |
//!
//! No recorder is installed here. Until the host installs one (for example a
//! Prometheus exporter), every call is a no-op.

use metrics::{Unit, counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

use crate::aggregator::{AggregatorStats, TaskSample};
use crate::domain::TaskState;

pub mod names {
    pub const TASKS_TOTAL: &str = "taskpulse_tasks_total";
    pub const TASK_RUNTIME_SECONDS: &str = "taskpulse_task_runtime_seconds";
    pub const TASK_LATENCY_SECONDS: &str = "taskpulse_task_latency_seconds";
    pub const WORKERS: &str = "taskpulse_workers";
    pub const EVENTS_TOTAL: &str = "taskpulse_events_total";
    pub const EVICTED_TASKS_TOTAL: &str = "taskpulse_evicted_tasks_total";
    pub const TASKS_IN_MEMORY: &str = "taskpulse_tasks_in_memory";
}

pub mod labels {
    pub const NAME: &str = "name";
    pub const STATE: &str = "state";
    pub const QUEUE: &str = "queue";
    pub const NAMESPACE: &str = "namespace";
}

/// Records task samples and aggregator counters.
#[derive(Debug, Clone)]
pub struct TaskMetrics {
    namespace: String,
}

impl TaskMetrics {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Register descriptions with the installed recorder.
    pub fn describe() {
        describe_counter!(names::TASKS_TOTAL, "Task events by name, state and queue");
        describe_histogram!(
            names::TASK_RUNTIME_SECONDS,
            Unit::Seconds,
            "Execution time of finished tasks"
        );
        describe_histogram!(
            names::TASK_LATENCY_SECONDS,
            Unit::Seconds,
            "Time between a task being received and started"
        );
        describe_gauge!(names::WORKERS, "Workers with a recent heartbeat");
        describe_counter!(names::EVENTS_TOTAL, "Task events ingested, including malformed ones");
        describe_counter!(
            names::EVICTED_TASKS_TOTAL,
            "In-flight tasks dropped to stay within capacity"
        );
        describe_gauge!(names::TASKS_IN_MEMORY, "Task records currently tracked");
    }

    pub fn record_sample(&self, sample: &TaskSample) {
        counter!(
            names::TASKS_TOTAL,
            labels::NAME => sample.name.clone(),
            labels::STATE => sample.state.as_str(),
            labels::QUEUE => sample.queue.clone(),
            labels::NAMESPACE => self.namespace.clone(),
        )
        .increment(1);

        if sample.state.is_terminal()
            && let Some(runtime) = sample.runtime
        {
            histogram!(
                names::TASK_RUNTIME_SECONDS,
                labels::NAME => sample.name.clone(),
                labels::QUEUE => sample.queue.clone(),
                labels::NAMESPACE => self.namespace.clone(),
            )
            .record(runtime.as_secs_f64());
        }

        // Terminal samples repeat the stored latency; count it once, at start.
        if sample.state == TaskState::Started
            && let Some(latency) = sample.latency
        {
            histogram!(
                names::TASK_LATENCY_SECONDS,
                labels::NAME => sample.name.clone(),
                labels::QUEUE => sample.queue.clone(),
                labels::NAMESPACE => self.namespace.clone(),
            )
            .record(latency.as_secs_f64());
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn set_workers(&self, alive: usize) {
        gauge!(names::WORKERS, labels::NAMESPACE => self.namespace.clone()).set(alive as f64);
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn record_stats(&self, stats: &AggregatorStats) {
        counter!(names::EVENTS_TOTAL, labels::NAMESPACE => self.namespace.clone())
            .absolute(stats.event_count);
        counter!(names::EVICTED_TASKS_TOTAL, labels::NAMESPACE => self.namespace.clone())
            .absolute(stats.evicted);
        gauge!(names::TASKS_IN_MEMORY, labels::NAMESPACE => self.namespace.clone())
            .set(stats.tasks_in_memory as f64);
    }
}

impl Default for TaskMetrics {
    fn default() -> Self {
        Self::new("default")
    }
}
