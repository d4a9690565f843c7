//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 時刻・ID・永続化・通知を trait で切り出し、テストでは差し替えます。

pub mod clock;
pub mod event_sink;
pub mod id_generator;
pub mod key_value;

pub use self::clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use self::event_sink::EventSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::key_value::{KeyValueStore, COMPANION_KEY};
