//! EventPipeline - イベント処理の流れ
//!
//! # フロー
//! 1. wire::decode() で JSON をデコード
//! 2. タスクイベント → Aggregator::ingest()（終端なら collect、それ以外は observe）
//! 3. ワーカーイベント → WorkerRegistry::record()
//! 4. TaskMetrics にサンプルとカウンタを出力

use std::sync::Arc;

use serde::Serialize;

use crate::aggregator::{Aggregator, AggregatorStats, TaskSample};
use crate::app::metrics::TaskMetrics;
use crate::config::ExporterConfig;
use crate::domain::{DecodeError, Event, WorkerEvent};
use crate::ports::{Clock, SystemClock};
use crate::wire::{self, WireEvent};
use crate::workers::WorkerRegistry;

/// What happened to one input event.
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    /// `None` for malformed task events.
    Task(Option<TaskSample>),
    Worker { discovered: bool },
    Ignored,
}

/// End-of-run (or scrape-time) summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    #[serde(flatten)]
    pub stats: AggregatorStats,
    pub workers_alive: usize,
    pub workers_known: usize,

    /// 生存中のワーカー（ホスト名順）
    pub alive_workers: Vec<String>,
}

pub struct EventPipeline {
    aggregator: Arc<Aggregator>,
    workers: Arc<WorkerRegistry>,
    metrics: TaskMetrics,
    clock: Arc<dyn Clock>,
}

impl EventPipeline {
    pub fn new(config: &ExporterConfig) -> Self {
        Self::with_parts(
            Arc::new(Aggregator::from_config(config)),
            Arc::new(WorkerRegistry::new(config.worker_expire_window)),
            TaskMetrics::new(config.namespace.clone()),
            Arc::new(SystemClock),
        )
    }

    pub fn with_parts(
        aggregator: Arc<Aggregator>,
        workers: Arc<WorkerRegistry>,
        metrics: TaskMetrics,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            aggregator,
            workers,
            metrics,
            clock,
        }
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    pub fn workers(&self) -> &Arc<WorkerRegistry> {
        &self.workers
    }

    /// Decode and handle one line of input.
    pub fn handle_line(&self, line: &str) -> Result<Handled, DecodeError> {
        wire::decode(line).map(|event| self.handle(event))
    }

    pub fn handle(&self, event: WireEvent) -> Handled {
        match event {
            WireEvent::Task(event) => Handled::Task(self.handle_task(&event)),
            WireEvent::Worker(event) => Handled::Worker {
                discovered: self.handle_worker(&event),
            },
            WireEvent::Ignored(kind) => {
                tracing::trace!(kind = %kind, "ignoring event");
                Handled::Ignored
            }
        }
    }

    pub fn handle_task(&self, event: &Event) -> Option<TaskSample> {
        let sample = self.aggregator.ingest(event);
        if let Some(sample) = &sample {
            self.metrics.record_sample(sample);
        }
        self.metrics.record_stats(&self.aggregator.stats());
        sample
    }

    pub fn handle_worker(&self, event: &WorkerEvent) -> bool {
        let discovered = self.workers.record(event);
        self.metrics
            .set_workers(self.workers.alive_count(self.clock.now()));
        discovered
    }

    /// Re-evaluate time-based gauges (worker expiry) without new input.
    pub fn tick(&self) {
        self.metrics
            .set_workers(self.workers.alive_count(self.clock.now()));
        self.metrics.record_stats(&self.aggregator.stats());
    }

    pub fn summary(&self) -> Summary {
        let alive_workers = self.workers.alive_workers(self.clock.now());
        Summary {
            stats: self.aggregator.stats(),
            workers_alive: alive_workers.len(),
            workers_known: self.workers.known_count(),
            alive_workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskState;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    const T0: f64 = 1_714_564_800.0;

    fn pipeline(clock: Arc<FixedClock>) -> EventPipeline {
        let config = ExporterConfig::default();
        EventPipeline::with_parts(
            Arc::new(Aggregator::from_config(&config)),
            Arc::new(WorkerRegistry::new(config.worker_expire_window)),
            TaskMetrics::new("test"),
            clock,
        )
    }

    fn line(kind: &str, extra: &str, secs: f64) -> String {
        format!(r#"{{"type": "{kind}", "timestamp": {secs}, "local_received": {secs}{extra}}}"#)
    }

    #[test]
    fn task_lifecycle_from_json_lines() {
        let clock = Arc::new(FixedClock::new(Utc.timestamp_opt(T0 as i64, 0).unwrap()));
        let pipeline = pipeline(clock);
        let id = r#", "uuid": "t1""#;

        let inputs = [
            line("task-sent", &format!(r#"{id}, "name": "billing.charge", "queue": "billing""#), T0),
            line("task-received", id, T0 + 1.0),
            line("task-started", id, T0 + 6.0),
            line("task-succeeded", &format!(r#"{id}, "runtime": 2.0"#), T0 + 8.0),
        ];
        let mut last = None;
        for input in &inputs {
            last = Some(pipeline.handle_line(input).unwrap());
        }

        let Some(Handled::Task(Some(sample))) = last.clone() else {
            panic!("expected a task sample, got {last:?}");
        };
        assert_eq!(sample.name, "billing.charge");
        assert_eq!(sample.queue, "billing");
        assert_eq!(sample.state, TaskState::Succeeded);
        assert_eq!(sample.latency, Some(Duration::from_secs(5)));
        assert_eq!(sample.runtime, Some(Duration::from_secs(2)));

        let summary = pipeline.summary();
        assert_eq!(summary.stats.event_count, 4);
        assert_eq!(summary.stats.task_count, 1);
        assert_eq!(summary.stats.tasks_in_memory, 0);
    }

    #[test]
    fn worker_events_update_liveness() {
        let clock = Arc::new(FixedClock::new(Utc.timestamp_opt(T0 as i64, 0).unwrap()));
        let pipeline = pipeline(clock.clone());

        let heartbeat = line("worker-heartbeat", r#", "hostname": "w1""#, T0);
        assert_eq!(
            pipeline.handle_line(&heartbeat).unwrap(),
            Handled::Worker { discovered: true }
        );
        assert_eq!(pipeline.summary().workers_alive, 1);
        assert_eq!(pipeline.summary().alive_workers, vec!["w1".to_string()]);

        clock.advance(chrono::Duration::seconds(60));
        pipeline.tick();
        let summary = pipeline.summary();
        assert_eq!(summary.workers_alive, 0);
        assert_eq!(summary.workers_known, 1);
        assert!(summary.alive_workers.is_empty());
    }

    #[test]
    fn malformed_and_ignored_input() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let pipeline = pipeline(clock);

        assert_eq!(
            pipeline.handle_line(&line("task-rejected", r#", "uuid": "t1""#, T0)).unwrap(),
            Handled::Task(None)
        );
        assert_eq!(
            pipeline.handle_line(r#"{"type": "scheduler-tick"}"#).unwrap(),
            Handled::Ignored
        );
        assert!(pipeline.handle_line("{").is_err());
        assert_eq!(pipeline.summary().stats.event_count, 1);
    }
}
