//! taskpulse-core
//!
//! Aggregates task lifecycle events from a distributed task queue into
//! bounded, queryable state for metrics export.
//!
//! # モジュール構成
//! - **domain**: イベント・状態・レコードなどのドメインモデル
//! - **routing**: タスク名からキューを解決する（ワイルドカード対応）
//! - **index**: 容量制限付き LRU インデックス
//! - **machine**: 1 イベントをタスクレコードへ適用する状態機械
//! - **aggregator**: スレッドセーフな集約ファサード
//! - **workers**: ワーカーの生存管理（heartbeat）
//! - **wire**: JSON イベントのデコード
//! - **ports / impls**: ルーティング設定の取得元（trait + 実装）
//! - **app**: ポーラー、パイプライン、メトリクス出力

pub mod config;
pub mod domain;
pub mod routing;
pub mod index;
pub mod machine;
pub mod aggregator;
pub mod workers;
pub mod wire;
pub mod ports;
pub mod impls;
pub mod app;

pub use aggregator::{Aggregator, AggregatorStats, TaskSample, UNDEFINED};
pub use config::ExporterConfig;
pub use domain::{Event, EventSubject, TaskRecord, TaskState, WorkerEvent, WorkerEventKind};
pub use index::BoundedTaskIndex;
pub use routing::{QueueBinding, RoutingTable, WorkerConf, resolve_queue};
pub use workers::WorkerRegistry;
