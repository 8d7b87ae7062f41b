//! Errors - エラー型
//!
//! The aggregator itself never fails. These cover its edges: configuration,
//! routing sources, and wire decoding.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_tasks_in_memory must be greater than zero")]
    ZeroCapacity,

    #[error("routing refresh interval must be greater than zero")]
    ZeroRefresh,

    #[error("worker expire window must be a positive number, got {0}")]
    InvalidExpireWindow(f64),

    #[error("default queue must not be empty")]
    EmptyDefaultQueue,
}

/// Failure to fetch routing configuration.
///
/// Callers downgrade this to "no routing information available".
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("failed to read routing config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid routing config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("routing source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid event json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event is missing field `{0}`")]
    MissingField(&'static str),

    #[error("event timestamp out of range: {0}")]
    InvalidTimestamp(f64),
}
