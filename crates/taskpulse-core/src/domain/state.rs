//! Task state as seen through lifecycle events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Task state (latest event wins).
///
/// State transitions:
/// - Sent -> Received -> Started -> Succeeded | Failed | Revoked
/// - Started -> Retried -> Received -> Started (ids reused across retries)
///
/// Transitions are never rejected: events can be lost or reordered upstream,
/// so the aggregator only records what it was told last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Published by a client, not yet picked up by a broker consumer.
    Sent,

    /// Delivered to a worker, waiting for an execution slot.
    Received,

    /// Being executed.
    Started,

    Succeeded,

    Failed,

    /// Failed, another attempt will follow.
    Retried,

    Revoked,
}

impl TaskState {
    /// Is this a terminal state (no further transitions expected)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Revoked
        )
    }

    /// Label value used when exporting this state.
    ///
    /// Matches the state names the task-queue system itself reports.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Sent => "SENT",
            TaskState::Received => "RECEIVED",
            TaskState::Started => "STARTED",
            TaskState::Succeeded => "SUCCESS",
            TaskState::Failed => "FAILURE",
            TaskState::Retried => "RETRY",
            TaskState::Revoked => "REVOKED",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TaskState::Sent, false)]
    #[case(TaskState::Received, false)]
    #[case(TaskState::Started, false)]
    #[case(TaskState::Retried, false)]
    #[case(TaskState::Succeeded, true)]
    #[case(TaskState::Failed, true)]
    #[case(TaskState::Revoked, true)]
    fn terminal_states(#[case] state: TaskState, #[case] terminal: bool) {
        assert_eq!(state.is_terminal(), terminal);
    }

    #[test]
    fn display_uses_export_label() {
        assert_eq!(TaskState::Succeeded.to_string(), "SUCCESS");
        assert_eq!(TaskState::Retried.to_string(), "RETRY");
    }
}
