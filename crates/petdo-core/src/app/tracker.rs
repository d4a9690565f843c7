//! Tracker - 単一のイベントループ
//!
//! # フロー
//! 1. A user action or a deadline tick mutates the TaskStore
//! 2. `settle()` drains the outbox into the DeadlineMonitor and the
//!    EventDeduplicator
//! 3. The deduplicator is observed until it has nothing unseen left; each
//!    propagation event becomes a reward or a penalty on the companion
//!
//! Every public mutation runs to completion, including step 3, before it
//! returns. Nothing is ever left half-propagated between calls.

use std::sync::Arc;

use crate::app::companion::CompanionEngine;
use crate::app::deadline::{DeadlineDisplay, DeadlineMonitor};
use crate::app::dedup::EventDeduplicator;
use crate::app::status::{TaskView, TrackerView};
use crate::app::task_store::{TaskSnapshot, TaskStore};
use crate::domain::{
    Companion, PropagationEvent, PropagationKind, PurchaseError, ShopCatalog, ShopItem, Task,
    TaskError, TaskId, TaskStatus,
};
use crate::ports::{Clock, IdGenerator};

pub struct Tracker {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    store: TaskStore,
    monitor: DeadlineMonitor,
    dedup: EventDeduplicator,
    companion: CompanionEngine,
}

impl Tracker {
    pub fn new(
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        companion: CompanionEngine,
    ) -> Self {
        Self {
            clock,
            ids,
            store: TaskStore::new(),
            monitor: DeadlineMonitor::new(),
            dedup: EventDeduplicator::new(),
            companion,
        }
    }

    /// Add a pending task. The deadline (if any) starts now.
    pub fn create(&mut self, text: &str, deadline_minutes: Option<u32>) -> Result<Task, TaskError> {
        let id = self.ids.generate_task_id();
        let now = self.clock.now();
        let task = self
            .store
            .create(id, text, deadline_minutes, now)
            .inspect_err(|err| tracing::debug!(error = %err, "create rejected"))?
            .clone();
        tracing::debug!(task_id = %task.id, deadline_minutes = ?task.deadline_minutes, "task created");
        self.settle();
        Ok(task)
    }

    /// User-driven status change. Failing a task is the monitor's call only.
    pub fn set_status(&mut self, id: TaskId, target: TaskStatus) -> Result<Task, TaskError> {
        if target == TaskStatus::Failed {
            tracing::debug!(task_id = %id, "manual failure rejected");
            return Err(TaskError::ReservedTransition { id, to: target });
        }
        let task = self
            .store
            .set_status(id, target)
            .inspect_err(|err| tracing::debug!(task_id = %id, error = %err, "status change rejected"))?
            .clone();
        self.settle();
        Ok(task)
    }

    /// failed -> pending with a fresh deadline window.
    pub fn retry(&mut self, id: TaskId) -> Result<Task, TaskError> {
        let now = self.clock.now();
        let task = self
            .store
            .retry(id, now)
            .inspect_err(|err| tracing::debug!(task_id = %id, error = %err, "retry rejected"))?
            .clone();
        tracing::debug!(task_id = %id, "task retried");
        self.settle();
        Ok(task)
    }

    pub fn delete(&mut self, id: TaskId) -> Result<Task, TaskError> {
        let removed = self
            .store
            .delete(id)
            .inspect_err(|err| tracing::debug!(task_id = %id, error = %err, "delete rejected"))?;
        tracing::debug!(task_id = %id, "task deleted");
        self.settle();
        Ok(removed)
    }

    /// Evaluate every running deadline against the clock. Expired tasks are
    /// failed and penalized before this returns. Returns the failed ids.
    pub fn tick(&mut self) -> Vec<TaskId> {
        let now = self.clock.now();
        let expired = self.monitor.tick(now);
        tracing::debug!(expired = expired.len(), tracked = self.monitor.len(), "deadline tick");

        let failed: Vec<TaskId> = expired
            .into_iter()
            .filter(|id| self.fail_expired(*id))
            .collect();
        self.settle();
        failed
    }

    fn fail_expired(&mut self, id: TaskId) -> bool {
        match self.store.set_status(id, TaskStatus::Failed) {
            Ok(_) => {
                tracing::info!(task_id = %id, "deadline expired; task failed");
                true
            }
            Err(err) => {
                tracing::debug!(task_id = %id, error = %err, "expiry skipped");
                false
            }
        }
    }

    pub fn purchase(&mut self, item: &'static ShopItem) -> Result<&Companion, PurchaseError> {
        match self.companion.purchase(item) {
            Ok(companion) => {
                tracing::info!(
                    item = item.id,
                    price = item.price,
                    balance = companion.currency,
                    "item purchased"
                );
                Ok(companion)
            }
            Err(err) => {
                tracing::debug!(item = item.id, error = %err, "purchase rejected");
                Err(err)
            }
        }
    }

    pub fn purchase_by_id(&mut self, item_id: &str) -> Result<&Companion, PurchaseError> {
        let item = ShopCatalog
            .find(item_id)
            .ok_or_else(|| PurchaseError::UnknownItem(item_id.to_string()))?;
        self.purchase(item)
    }

    pub fn tasks(&self) -> TaskSnapshot {
        self.store.snapshot()
    }

    pub fn companion(&self) -> &Companion {
        self.companion.companion()
    }

    pub fn deadline_display(&self, id: TaskId) -> Option<DeadlineDisplay> {
        self.monitor.display(id, self.clock.now())
    }

    pub fn view(&self) -> TrackerView {
        let now = self.clock.now();
        let tasks = self
            .store
            .snapshot()
            .iter()
            .map(|task| TaskView::new(task, self.monitor.display(task.id, now)))
            .collect();
        TrackerView {
            tasks,
            companion: self.companion.companion().clone(),
        }
    }

    fn settle(&mut self) {
        let now = self.clock.now();
        loop {
            let changes = self.store.drain_changes();
            if changes.is_empty() {
                break;
            }
            let mut touched = Vec::with_capacity(changes.len());
            for change in &changes {
                self.monitor.sync(change);
                self.dedup.on_change(change);
                touched.push(change.task_id());
            }
            // a reopened task keeps its anchor and may already be overdue
            for id in self.monitor.tick_only(&touched, now) {
                self.fail_expired(id);
            }
        }

        let snapshot = self.store.snapshot();
        loop {
            let events = self.dedup.observe(&snapshot);
            if events.is_empty() {
                break;
            }
            for event in events {
                self.forward(event);
            }
        }
    }

    fn forward(&mut self, event: PropagationEvent) {
        match event.kind {
            PropagationKind::Completed => {
                let companion = self.companion.apply_reward();
                tracing::info!(
                    task_id = %event.task_id,
                    currency = companion.currency,
                    experience = companion.experience,
                    level = companion.level,
                    "task completed; companion rewarded"
                );
            }
            PropagationKind::Failed => {
                let companion = self.companion.apply_penalty();
                tracing::info!(
                    task_id = %event.task_id,
                    health = companion.health,
                    "task failed; companion penalized"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::companion::CompanionDefaults;
    use crate::domain::{CompanionEvent, Mood};
    use crate::impls::{InMemoryStore, RecordingSink};
    use crate::ports::{ManualClock, UlidGenerator};
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;

    struct Harness {
        tracker: Tracker,
        clock: Arc<ManualClock>,
        sink: Arc<RecordingSink>,
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 5, 5, 9, 0, 0).unwrap(),
        ));
        let sink = Arc::new(RecordingSink::new());
        let engine = CompanionEngine::init(
            Arc::new(InMemoryStore::new()),
            sink.clone(),
            &CompanionDefaults::default(),
        );
        let tracker = Tracker::new(
            clock.clone(),
            Arc::new(UlidGenerator::new(clock.clone())),
            engine,
        );
        Harness {
            tracker,
            clock,
            sink,
        }
    }

    #[test]
    fn completion_rewards_exactly_once() {
        let mut h = harness();
        let task = h.tracker.create("water plants", None).unwrap();

        h.tracker.set_status(task.id, TaskStatus::Completed).unwrap();
        for _ in 0..3 {
            h.tracker.tick();
        }
        h.tracker.create("another", None).unwrap();

        let companion = h.tracker.companion();
        assert_eq!(companion.currency, 10);
        assert_eq!(companion.experience, 5);
        assert_eq!(companion.level, 1);
        assert_eq!(companion.mood, Mood::Happy);
        assert_eq!(h.sink.events().len(), 1);
    }

    #[test]
    fn reopen_and_recomplete_rewards_again() {
        let mut h = harness();
        let task = h.tracker.create("laundry", None).unwrap();

        h.tracker.set_status(task.id, TaskStatus::Completed).unwrap();
        h.tracker.set_status(task.id, TaskStatus::Pending).unwrap();
        h.tracker.set_status(task.id, TaskStatus::Completed).unwrap();

        assert_eq!(h.tracker.companion().currency, 20);
        assert_eq!(h.tracker.companion().experience, 10);
    }

    #[test]
    fn expired_deadline_fails_and_penalizes_once() {
        let mut h = harness();
        let task = h.tracker.create("call mom", Some(30)).unwrap();

        h.clock.advance(Duration::minutes(29));
        assert!(h.tracker.tick().is_empty());

        h.clock.advance(Duration::minutes(2));
        assert_eq!(h.tracker.tick(), vec![task.id]);
        assert!(h.tracker.tick().is_empty());

        let snapshot = h.tracker.tasks();
        assert_eq!(snapshot.get(task.id).unwrap().status, TaskStatus::Failed);
        assert_eq!(h.tracker.companion().health, 85);
        assert_eq!(h.tracker.companion().mood, Mood::Sad);
        assert_eq!(
            h.sink.events(),
            vec![CompanionEvent::PenaltyApplied { health_delta: -15 }]
        );
    }

    #[test]
    fn paused_task_still_expires() {
        let mut h = harness();
        let task = h.tracker.create("stretch", Some(10)).unwrap();
        h.tracker.set_status(task.id, TaskStatus::Paused).unwrap();

        h.clock.advance(Duration::minutes(10));

        assert_eq!(h.tracker.tick(), vec![task.id]);
    }

    #[test]
    fn completed_task_never_expires() {
        let mut h = harness();
        let task = h.tracker.create("done early", Some(5)).unwrap();
        h.tracker.set_status(task.id, TaskStatus::Completed).unwrap();

        h.clock.advance(Duration::hours(3));

        assert!(h.tracker.tick().is_empty());
        assert_eq!(h.tracker.companion().health, 100);
        assert_eq!(h.tracker.deadline_display(task.id), None);
    }

    #[test]
    fn retry_restores_full_deadline() {
        let mut h = harness();
        let task = h.tracker.create("essay", Some(30)).unwrap();
        h.clock.advance(Duration::minutes(45));
        h.tracker.tick();

        h.tracker.retry(task.id).unwrap();

        assert_eq!(
            h.tracker.deadline_display(task.id),
            Some(DeadlineDisplay::Remaining {
                hours: 0,
                minutes: 30
            })
        );
        h.clock.advance(Duration::minutes(30));
        assert_eq!(h.tracker.tick(), vec![task.id]);
        assert_eq!(h.tracker.companion().health, 70);
    }

    #[test]
    fn reopening_an_overdue_task_fails_it_at_once() {
        let mut h = harness();
        let task = h.tracker.create("report", Some(30)).unwrap();
        h.tracker.set_status(task.id, TaskStatus::Completed).unwrap();
        h.clock.advance(Duration::minutes(40));

        let reopened = h.tracker.set_status(task.id, TaskStatus::Pending).unwrap();

        assert_eq!(reopened.status, TaskStatus::Pending);
        assert_eq!(
            h.tracker.tasks().get(task.id).unwrap().status,
            TaskStatus::Failed
        );
        assert_eq!(h.tracker.companion().health, 85);
        assert_eq!(h.tracker.companion().currency, 10);
        assert!(matches!(
            h.tracker.set_status(task.id, TaskStatus::Completed),
            Err(TaskError::InvalidTransition { .. })
        ));
        assert!(h.tracker.tick().is_empty());
        assert_eq!(
            h.sink.events(),
            vec![
                CompanionEvent::RewardGranted {
                    coins: 10,
                    experience: 5
                },
                CompanionEvent::PenaltyApplied { health_delta: -15 },
            ]
        );
    }

    #[test]
    fn reopening_within_deadline_keeps_running() {
        let mut h = harness();
        let task = h.tracker.create("report", Some(30)).unwrap();
        h.tracker.set_status(task.id, TaskStatus::Completed).unwrap();
        h.clock.advance(Duration::minutes(10));

        h.tracker.set_status(task.id, TaskStatus::Pending).unwrap();

        assert_eq!(
            h.tracker.deadline_display(task.id),
            Some(DeadlineDisplay::Remaining {
                hours: 0,
                minutes: 20
            })
        );
    }

    #[rstest]
    #[case::from_pending(None)]
    #[case::from_paused(Some(TaskStatus::Paused))]
    fn manual_failure_is_reserved(#[case] first: Option<TaskStatus>) {
        let mut h = harness();
        let task = h.tracker.create("x", Some(10)).unwrap();
        if let Some(status) = first {
            h.tracker.set_status(task.id, status).unwrap();
        }

        let err = h.tracker.set_status(task.id, TaskStatus::Failed).unwrap_err();

        assert!(matches!(err, TaskError::ReservedTransition { .. }));
        assert_eq!(h.tracker.companion().health, 100);
    }

    #[test]
    fn health_floors_at_zero() {
        let mut h = harness();
        for i in 0..8 {
            h.tracker.create(&format!("chore {i}"), Some(1)).unwrap();
        }

        h.clock.advance(Duration::minutes(1));
        let failed = h.tracker.tick();

        assert_eq!(failed.len(), 8);
        assert_eq!(h.tracker.companion().health, 0);
        assert_eq!(h.sink.events().len(), 8);
    }

    #[test]
    fn delete_unknown_is_noop() {
        let mut h = harness();
        h.tracker.create("keep", None).unwrap();
        let ghost = TaskId::from_ulid(ulid::Ulid::new());

        assert_eq!(h.tracker.delete(ghost), Err(TaskError::NotFound(ghost)));
        assert_eq!(h.tracker.tasks().len(), 1);
    }

    #[test]
    fn delete_cancels_deadline() {
        let mut h = harness();
        let task = h.tracker.create("temp", Some(1)).unwrap();
        h.tracker.delete(task.id).unwrap();

        h.clock.advance(Duration::minutes(5));

        assert!(h.tracker.tick().is_empty());
        assert_eq!(h.tracker.companion().health, 100);
    }

    #[test]
    fn purchase_after_earning() {
        let mut h = harness();
        for i in 0..3 {
            let task = h.tracker.create(&format!("t{i}"), None).unwrap();
            h.tracker.set_status(task.id, TaskStatus::Completed).unwrap();
        }

        let companion = h.tracker.purchase_by_id("toy").unwrap();

        assert_eq!(companion.currency, 0);
        assert!(matches!(
            h.tracker.purchase_by_id("toy"),
            Err(PurchaseError::InsufficientFunds { price: 30, balance: 0 })
        ));
    }

    #[test]
    fn unknown_item_is_rejected() {
        let mut h = harness();
        assert_eq!(
            h.tracker.purchase_by_id("dragon").map(|_| ()),
            Err(PurchaseError::UnknownItem("dragon".to_string()))
        );
    }

    #[test]
    fn view_lists_tasks_with_deadlines() {
        let mut h = harness();
        let timed = h.tracker.create("timed", Some(90)).unwrap();
        let open = h.tracker.create("open", None).unwrap();
        h.clock.advance(Duration::minutes(20));

        let view = h.tracker.view();

        assert_eq!(view.tasks.len(), 2);
        assert_eq!(
            view.task(timed.id).unwrap().deadline,
            Some(DeadlineDisplay::Remaining {
                hours: 1,
                minutes: 10
            })
        );
        assert_eq!(view.task(open.id).unwrap().deadline, None);
        assert_eq!(view.companion, *h.tracker.companion());
    }
}
