//! Fixed routing configuration.

use async_trait::async_trait;

use crate::domain::RoutingError;
use crate::ports::RoutingSource;
use crate::routing::WorkerConf;

#[derive(Debug, Clone, Default)]
pub struct StaticRoutingSource {
    confs: Vec<WorkerConf>,
}

impl StaticRoutingSource {
    pub fn new(confs: Vec<WorkerConf>) -> Self {
        Self { confs }
    }
}

#[async_trait]
impl RoutingSource for StaticRoutingSource {
    async fn fetch(&self) -> Result<Vec<WorkerConf>, RoutingError> {
        Ok(self.confs.clone())
    }
}
