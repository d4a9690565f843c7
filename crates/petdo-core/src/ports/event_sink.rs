//! EventSink port - コンパニオンイベントの通知先
//!
//! Consumers are purely presentational (reward / penalty / purchase
//! animations), so `emit` has no return value and implementations may drop
//! events freely.

use crate::domain::CompanionEvent;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: CompanionEvent);
}
