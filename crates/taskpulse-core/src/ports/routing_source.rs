//! RoutingSource port - ルーティング設定の取得元
//!
//! The broker-configuration loader lives outside the core. Whatever it talks
//! to (a control channel on the workers, a file, a config service), it hands
//! back one [`WorkerConf`] per worker that answered.

use async_trait::async_trait;

use crate::domain::RoutingError;
use crate::routing::WorkerConf;

/// Source of routing configuration.
///
/// # エラー時の扱い
/// - Errors are downgraded by the poller to "no routing information".
/// - Implementations should not retry internally; the poller asks again on
///   its next tick.
#[async_trait]
pub trait RoutingSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<WorkerConf>, RoutingError>;
}
