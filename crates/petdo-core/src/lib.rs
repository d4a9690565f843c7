//! petdo-core
//!
//! Task tracking with per-task deadlines, driving a virtual companion:
//! completing a task rewards it, missing a deadline hurts it, and coins buy
//! items from a fixed shop.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, companion, shop, events, errors）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, KeyValueStore, EventSink）
//! - **app**: アプリケーションロジック（TaskStore, DeadlineMonitor, Tracker, runtime など）
//! - **impls**: ports の実装（InMemoryStore, JsonFileStore, sinks）
//! - **config**: 設定ファイルの読み込み

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{Tracker, TrackerBuilder, TrackerHandle, TrackerRuntime, TrackerView};
pub use config::{ConfigError, TrackerConfig};
