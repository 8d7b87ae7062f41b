//! Worker liveness from online / heartbeat / offline events.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::domain::{WorkerEvent, WorkerEventKind};

#[derive(Debug, Clone)]
struct Liveness {
    last_heartbeat: DateTime<Utc>,
    freq: Duration,
    online: bool,
}

impl Liveness {
    fn expires_at(&self, expire_window: f64) -> DateTime<Utc> {
        Duration::try_from_secs_f64(self.freq.as_secs_f64() * expire_window)
            .ok()
            .and_then(|grace| chrono::Duration::from_std(grace).ok())
            .and_then(|grace| self.last_heartbeat.checked_add_signed(grace))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// WorkerRegistry はワーカーの生存を管理
///
/// offline を通知しておらず、最後の heartbeat から
/// `freq * expire_window` 以内なら生存とみなす。
pub struct WorkerRegistry {
    expire_window: f64,
    workers: Mutex<HashMap<String, Liveness>>,
}

impl WorkerRegistry {
    pub fn new(expire_window: f64) -> Self {
        Self {
            expire_window,
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// ワーカーイベントを適用。初めて見たワーカーなら `true`
    pub fn record(&self, event: &WorkerEvent) -> bool {
        if event.hostname.is_empty() {
            tracing::warn!(kind = ?event.kind, "dropping worker event without hostname");
            return false;
        }

        let mut workers = self.workers.lock();
        let online = event.kind != WorkerEventKind::Offline;
        match workers.get_mut(&event.hostname) {
            Some(worker) => {
                // 順序が入れ替わった heartbeat で時刻を巻き戻さない
                if event.timestamp >= worker.last_heartbeat {
                    worker.last_heartbeat = event.timestamp;
                    worker.freq = event.freq;
                    worker.online = online;
                }
                false
            }
            None => {
                tracing::info!(worker = %event.hostname, kind = ?event.kind, "discovered worker");
                workers.insert(
                    event.hostname.clone(),
                    Liveness {
                        last_heartbeat: event.timestamp,
                        freq: event.freq,
                        online,
                    },
                );
                true
            }
        }
    }

    pub fn alive_count(&self, now: DateTime<Utc>) -> usize {
        self.workers
            .lock()
            .values()
            .filter(|w| w.online && now <= w.expires_at(self.expire_window))
            .count()
    }

    /// 生存中のワーカーのホスト名（ソート済み）
    pub fn alive_workers(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut alive: Vec<String> = self
            .workers
            .lock()
            .iter()
            .filter(|(_, w)| w.online && now <= w.expires_at(self.expire_window))
            .map(|(host, _)| host.clone())
            .collect();
        alive.sort();
        alive
    }

    /// これまでに見たワーカー数
    pub fn known_count(&self) -> usize {
        self.workers.lock().len()
    }
}
