//! App - アプリケーション層
//!
//! 集約器・ワーカー管理・ルーティング取得を組み合わせて、
//! 入力イベントをメトリクスへ流します。
//!
//! # 主要コンポーネント
//! - **EventPipeline**: デコード → 集約 → メトリクス出力
//! - **RoutingPoller**: ルーティング設定の定期リフレッシュ
//! - **TaskMetrics**: `metrics` ファサードへの出力

pub mod metrics;
pub mod pipeline;
pub mod poller;

// 主要な型を再エクスポート
pub use self::metrics::TaskMetrics;
pub use self::pipeline::{EventPipeline, Handled, Summary};
pub use self::poller::RoutingPoller;
