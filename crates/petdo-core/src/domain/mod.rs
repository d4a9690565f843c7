//! Domain - ドメインモデル
//!
//! ids / task / companion / shop / events / errors。
//! 純粋なデータと関数だけで、時計・ストレージ・ログには触れない。

pub mod companion;
pub mod errors;
pub mod events;
pub mod ids;
pub mod shop;
pub mod task;

pub use companion::{level_for, Appearance, Companion, Mood, Species, MAX_HEALTH};
pub use errors::{PurchaseError, StoreError, TaskError};
pub use events::{CompanionEvent, PropagationEvent, PropagationKind, TaskChange};
pub use ids::{ParseIdError, TaskId};
pub use shop::{can_afford, Effect, ShopCatalog, ShopItem};
pub use task::{deadline_from_parts, Task, TaskStatus, MAX_DEADLINE_MINUTES};
