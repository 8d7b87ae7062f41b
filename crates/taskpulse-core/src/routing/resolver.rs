//! Wildcard queue resolution.

use std::collections::HashMap;

use super::QueueBinding;

/// Route patterns to try for `task_name`, most specific first.
///
/// `"a.b.c"` yields `["a.b.c", "a.b.*", "a.*"]`. The first segment is always
/// kept, so a bare `*` is never produced.
pub fn candidates(task_name: &str) -> Vec<String> {
    let segments: Vec<&str> = task_name.split('.').collect();
    let mut out = Vec::with_capacity(segments.len());
    out.push(task_name.to_string());
    for keep in (1..segments.len()).rev() {
        out.push(format!("{}.*", segments[..keep].join(".")));
    }
    out
}

/// Resolve the queue `task_name` is routed to.
///
/// The first candidate present in `routes` decides: its explicit `queue` if
/// it has one, `default_queue` otherwise. Unmatched names get `default_queue`.
/// Never fails.
pub fn resolve_queue(
    task_name: &str,
    routes: &HashMap<String, QueueBinding>,
    default_queue: &str,
) -> String {
    if routes.is_empty() {
        return default_queue.to_string();
    }
    for candidate in candidates(task_name) {
        if let Some(binding) = routes.get(&candidate) {
            return binding
                .queue
                .clone()
                .unwrap_or_else(|| default_queue.to_string());
        }
    }
    default_queue.to_string()
}
