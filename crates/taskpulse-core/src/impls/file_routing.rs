//! Routing configuration read from a JSON file.
//!
//! The file holds an array of worker configurations:
//!
//! ```json
//! [{"hostname": "w1", "task_default_queue": "default",
//!   "task_routes": {"billing.*": {"queue": "billing"}, "reports.*": "slow"}}]
//! ```
//!
//! The file is re-read on every fetch, so edits are picked up by the poller.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::RoutingError;
use crate::ports::RoutingSource;
use crate::routing::WorkerConf;

#[derive(Debug, Clone)]
pub struct JsonFileRoutingSource {
    path: PathBuf,
}

impl JsonFileRoutingSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RoutingSource for JsonFileRoutingSource {
    async fn fetch(&self) -> Result<Vec<WorkerConf>, RoutingError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| RoutingError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(serde_json::from_str(&contents)?)
    }
}
