//! Routing snapshot merged from worker configurations.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::resolve_queue;

/// Where a route pattern sends tasks.
///
/// Deserializes from either `{"queue": "q", ...}` or a bare `"q"`. Keys other
/// than `queue` (`exchange`, `routing_key`, ...) are carried but unused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBinding")]
pub struct QueueBinding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,

    #[serde(flatten)]
    pub options: BTreeMap<String, serde_json::Value>,
}

impl QueueBinding {
    pub fn to_queue(queue: impl Into<String>) -> Self {
        Self {
            queue: Some(queue.into()),
            options: BTreeMap::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBinding {
    Queue(String),
    Options {
        #[serde(default)]
        queue: Option<String>,
        #[serde(flatten)]
        options: BTreeMap<String, serde_json::Value>,
    },
}

impl From<RawBinding> for QueueBinding {
    fn from(raw: RawBinding) -> Self {
        match raw {
            RawBinding::Queue(queue) => QueueBinding::to_queue(queue),
            RawBinding::Options { queue, options } => QueueBinding { queue, options },
        }
    }
}

/// Routing configuration reported by one worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerConf {
    #[serde(default)]
    pub hostname: String,

    #[serde(default)]
    pub task_routes: HashMap<String, QueueBinding>,

    #[serde(default)]
    pub task_default_queue: Option<String>,
}

/// Immutable routing snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingTable {
    routes: HashMap<String, QueueBinding>,
    default_queue: Option<String>,
}

impl RoutingTable {
    pub fn new(routes: HashMap<String, QueueBinding>, default_queue: Option<String>) -> Self {
        Self {
            routes,
            default_queue,
        }
    }

    /// Merge worker configurations in order.
    ///
    /// The first worker to bind a pattern wins, and so does the first worker
    /// to declare a default queue. Later disagreements are logged and ignored.
    pub fn from_worker_confs(confs: &[WorkerConf]) -> Self {
        let mut routes: HashMap<String, QueueBinding> = HashMap::new();
        let mut default_queue: Option<String> = None;

        for conf in confs {
            for (pattern, binding) in &conf.task_routes {
                match routes.get(pattern) {
                    Some(existing) if existing != binding => {
                        tracing::debug!(
                            pattern = %pattern,
                            worker = %conf.hostname,
                            "ignoring conflicting route binding"
                        );
                    }
                    Some(_) => {}
                    None => {
                        routes.insert(pattern.clone(), binding.clone());
                    }
                }
            }

            if let Some(queue) = conf.task_default_queue.as_ref().filter(|q| !q.is_empty()) {
                match &default_queue {
                    None => default_queue = Some(queue.clone()),
                    Some(first) if first != queue => {
                        tracing::debug!(
                            worker = %conf.hostname,
                            kept = %first,
                            ignored = %queue,
                            "workers disagree on default queue"
                        );
                    }
                    Some(_) => {}
                }
            }
        }

        Self::new(routes, default_queue)
    }

    pub fn default_queue(&self) -> Option<&str> {
        self.default_queue.as_deref()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolve `task_name`, preferring the workers' declared default queue
    /// over `fallback_default`.
    pub fn resolve(&self, task_name: &str, fallback_default: &str) -> String {
        let default_queue = self.default_queue.as_deref().unwrap_or(fallback_default);
        resolve_queue(task_name, &self.routes, default_queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conf(hostname: &str, routes: &[(&str, &str)], default_queue: Option<&str>) -> WorkerConf {
        WorkerConf {
            hostname: hostname.to_string(),
            task_routes: routes
                .iter()
                .map(|(p, q)| (p.to_string(), QueueBinding::to_queue(*q)))
                .collect(),
            task_default_queue: default_queue.map(str::to_string),
        }
    }

    #[test]
    fn binding_accepts_object_or_string() {
        let routes: HashMap<String, QueueBinding> = serde_json::from_str(
            r#"{
                "a.*": {"queue": "q1", "routing_key": "a"},
                "b.*": "q2",
                "c.*": {"exchange": "direct"}
            }"#,
        )
        .unwrap();

        assert_eq!(routes["a.*"].queue.as_deref(), Some("q1"));
        assert_eq!(routes["a.*"].options["routing_key"], "a");
        assert_eq!(routes["b.*"].queue.as_deref(), Some("q2"));
        assert_eq!(routes["c.*"].queue, None);
    }

    #[test]
    fn first_worker_wins_for_routes_and_default() {
        let table = RoutingTable::from_worker_confs(&[
            conf("w1", &[("a.*", "first")], Some("default-1")),
            conf("w2", &[("a.*", "second"), ("b.*", "b")], Some("default-2")),
        ]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.default_queue(), Some("default-1"));
        assert_eq!(table.resolve("a.x", "celery"), "first");
        assert_eq!(table.resolve("b.x", "celery"), "b");
        assert_eq!(table.resolve("zzz", "celery"), "default-1");
    }

    #[test]
    fn fallback_default_used_without_declared_default() {
        let table = RoutingTable::from_worker_confs(&[conf("w1", &[], None)]);
        assert!(table.is_empty());
        assert_eq!(table.resolve("a.b", "celery"), "celery");
    }

    #[test]
    fn worker_conf_parses_with_missing_fields() {
        let confs: Vec<WorkerConf> =
            serde_json::from_str(r#"[{"hostname": "w1"}, {"task_default_queue": "main"}]"#)
                .unwrap();
        let table = RoutingTable::from_worker_confs(&confs);
        assert_eq!(table.default_queue(), Some("main"));
    }
}
