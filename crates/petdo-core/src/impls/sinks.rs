//! Sinks - EventSink の実装
//!
//! - **NoopSink**: drops everything
//! - **TracingSink**: logs each event
//! - **BroadcastSink**: fans out to tokio broadcast subscribers (UI / animation)
//! - **RecordingSink**: keeps events in memory for assertions

use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::domain::CompanionEvent;
use crate::ports::EventSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: CompanionEvent) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: CompanionEvent) {
        match event {
            CompanionEvent::RewardGranted { coins, experience } => {
                tracing::info!(coins, experience, "reward granted");
            }
            CompanionEvent::PenaltyApplied { health_delta } => {
                tracing::info!(health_delta, "penalty applied");
            }
            CompanionEvent::PurchaseMade { item } => {
                tracing::info!(item, "purchase made");
            }
        }
    }
}

/// Publishes events on a broadcast channel. Sending with no subscribers
/// fails, which is fine: nobody was watching the animation.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<CompanionEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CompanionEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: CompanionEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<CompanionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CompanionEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: CompanionEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn emit(&self, event: CompanionEvent) {
        (**self).emit(event)
    }
}
