//! App - アプリケーション層
//!
//! domain と ports を組み合わせて、タスク追跡とコンパニオン育成を実装します。
//!
//! # 主要コンポーネント
//! - **TaskStore**: タスク一覧（copy-on-write snapshot + 変更 outbox）
//! - **DeadlineMonitor**: タスクごとの deadline 登録と期限判定
//! - **EventDeduplicator**: 完了 / 失敗を 1 回だけ伝播
//! - **CompanionEngine**: 報酬・ペナルティ・購入と永続化
//! - **Tracker**: 上記を束ねる単一イベントループ
//! - **TrackerBuilder**: 構築とワイヤリング
//! - **TrackerRuntime**: tokio 上のホスト（コマンド / 定期 tick / view 配信）

pub mod builder;
pub mod companion;
pub mod deadline;
pub mod dedup;
pub mod runtime;
pub mod status;
pub mod task_store;
pub mod tracker;

// 主要な型を再エクスポート
pub use self::builder::TrackerBuilder;
pub use self::companion::{CompanionDefaults, CompanionEngine};
pub use self::deadline::{DeadlineDisplay, DeadlineMonitor};
pub use self::dedup::EventDeduplicator;
pub use self::runtime::{RuntimeError, TrackerHandle, TrackerRuntime};
pub use self::status::{TaskView, TrackerView};
pub use self::task_store::{TaskSnapshot, TaskStore};
pub use self::tracker::Tracker;
