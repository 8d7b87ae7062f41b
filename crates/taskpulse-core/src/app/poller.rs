//! RoutingPoller - ルーティング設定の定期取得
//!
//! # フロー
//! 1. RoutingSource::fetch() で各ワーカーの設定を取得
//! 2. RoutingTable::from_worker_confs() でマージ（first writer wins）
//! 3. Aggregator::set_routing() でスナップショットを差し替え
//!
//! A failed fetch installs an empty table rather than keeping stale routes:
//! "no routing information" resolves every name to the default queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::aggregator::Aggregator;
use crate::ports::RoutingSource;
use crate::routing::RoutingTable;

pub struct RoutingPoller<S> {
    source: S,
    aggregator: Arc<Aggregator>,
    interval: Duration,
}

impl<S: RoutingSource> RoutingPoller<S> {
    pub fn new(source: S, aggregator: Arc<Aggregator>, interval: Duration) -> Self {
        Self {
            source,
            aggregator,
            interval,
        }
    }

    /// Fetch once and install the result. Returns the number of route patterns.
    pub async fn refresh_once(&self) -> usize {
        let table = match self.source.fetch().await {
            Ok(confs) => {
                let table = RoutingTable::from_worker_confs(&confs);
                tracing::info!(
                    workers = confs.len(),
                    routes = table.len(),
                    default_queue = table.default_queue().unwrap_or("-"),
                    "routing refreshed"
                );
                table
            }
            Err(err) => {
                tracing::warn!(error = %err, "routing fetch failed, continuing without routing information");
                RoutingTable::default()
            }
        };
        let routes = table.len();
        self.aggregator.set_routing(table);
        routes
    }

    /// Refresh immediately, then every `interval` until `shutdown` flips to
    /// `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!("routing poller stopped");
                        break;
                    }
                }
            }
        }
    }
}
