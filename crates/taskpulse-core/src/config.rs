//! Exporter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ConfigError;

/// Queue tasks land on when no route matches.
pub const DEFAULT_QUEUE: &str = "celery";

/// Tunables for the aggregator and its collaborators.
///
/// Missing fields fall back to [`ExporterConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Upper bound on in-flight task records.
    pub max_tasks_in_memory: usize,

    /// Queue used when routing does not name one.
    pub default_queue: String,

    /// How often routing configuration is re-fetched, in seconds.
    pub routing_refresh_secs: u64,

    /// A worker is considered gone after `freq * worker_expire_window`
    /// without a heartbeat.
    pub worker_expire_window: f64,

    /// Value of the `namespace` label on every exported metric.
    pub namespace: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            max_tasks_in_memory: 10_000,
            default_queue: DEFAULT_QUEUE.to_string(),
            routing_refresh_secs: 60,
            worker_expire_window: 2.0,
            namespace: "default".to_string(),
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tasks_in_memory == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.routing_refresh_secs == 0 {
            return Err(ConfigError::ZeroRefresh);
        }
        if !(self.worker_expire_window.is_finite() && self.worker_expire_window > 0.0) {
            return Err(ConfigError::InvalidExpireWindow(self.worker_expire_window));
        }
        if self.default_queue.is_empty() {
            return Err(ConfigError::EmptyDefaultQueue);
        }
        Ok(())
    }

    pub fn routing_refresh(&self) -> Duration {
        Duration::from_secs(self.routing_refresh_secs)
    }
}
