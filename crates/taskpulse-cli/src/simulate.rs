//! Synthetic task lifecycles for trying the pipeline without a broker.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use ulid::Ulid;

use taskpulse_core::app::EventPipeline;
use taskpulse_core::wire::WireEvent;
use taskpulse_core::{Event, EventSubject, WorkerEvent, WorkerEventKind};

const TASK_NAMES: &[(&str, &str)] = &[
    ("billing.charge", "billing"),
    ("billing.refund", "billing"),
    ("reports.daily", "reports"),
    ("mail.send", "celery"),
];
const WORKERS: &[&str] = &["worker-1", "worker-2", "worker-3"];

pub fn run(pipeline: &EventPipeline, count: usize) {
    let mut rng = rand::thread_rng();
    let mut now = Utc::now();

    for host in WORKERS {
        pipeline.handle(WireEvent::Worker(WorkerEvent::new(
            *host,
            WorkerEventKind::Online,
            now,
        )));
    }

    for _ in 0..count {
        let id = Ulid::new().to_string();
        let Some(&(name, queue)) = TASK_NAMES.choose(&mut rng) else {
            return;
        };
        let host = WORKERS.choose(&mut rng).copied().unwrap_or("worker-1");

        for event in lifecycle(&mut rng, &id, name, queue, host, now) {
            pipeline.handle(WireEvent::Task(event));
        }
        now += Duration::milliseconds(rng.gen_range(10..500));
        pipeline.handle(WireEvent::Worker(WorkerEvent::new(
            host,
            WorkerEventKind::Heartbeat,
            now,
        )));
    }

    tracing::info!(tasks = count, "simulation finished");
}

/// sent → received → started → (retry → received → started)* → outcome
fn lifecycle(
    rng: &mut impl Rng,
    id: &str,
    name: &str,
    queue: &str,
    host: &str,
    start: DateTime<Utc>,
) -> Vec<Event> {
    let mut at = start;
    let mut events = vec![
        Event::new(id, EventSubject::Sent, start)
            .with_name(name)
            .with_queue(queue)
            .with_hostname("producer"),
    ];

    let retries = if rng.gen_bool(0.1) { rng.gen_range(1..=2) } else { 0 };
    for attempt in 0..=retries {
        let received = advance(rng, &mut at, 200);
        events.push(Event::new(id, EventSubject::Received, received).with_hostname(host));
        let started = advance(rng, &mut at, 2_000);
        events.push(Event::new(id, EventSubject::Started, started).with_hostname(host));
        if attempt < retries {
            let retried = advance(rng, &mut at, 300);
            events.push(Event::new(id, EventSubject::Retried, retried).with_hostname(host));
        }
    }

    let runtime_ms = rng.gen_range(5..1_500);
    let finished = advance(rng, &mut at, runtime_ms);
    let outcome = if rng.gen_bool(0.9) {
        EventSubject::Succeeded
    } else {
        EventSubject::Failed
    };
    events.push(
        Event::new(id, outcome, finished)
            .with_hostname(host)
            .with_runtime(std::time::Duration::from_millis(runtime_ms.unsigned_abs())),
    );
    events
}

fn advance(rng: &mut impl Rng, at: &mut DateTime<Utc>, max_ms: i64) -> DateTime<Utc> {
    *at += Duration::milliseconds(rng.gen_range(1..max_ms));
    *at
}
