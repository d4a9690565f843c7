use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use petdo_core::app::{DeadlineDisplay, TrackerBuilder};
use petdo_core::domain::{Companion, CompanionEvent, PurchaseError, TaskError, TaskStatus};
use petdo_core::impls::{JsonFileStore, RecordingSink};
use petdo_core::ports::{Clock, KeyValueStore, ManualClock, COMPANION_KEY};
use rstest::rstest;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 10, 1, 8, 0, 0).unwrap(),
    ))
}

#[test]
fn completed_task_pays_once_and_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()));
    let clock = clock();

    {
        let mut tracker = TrackerBuilder::new()
            .clock(clock.clone())
            .store(store.clone())
            .build();
        let task = tracker.create("write report", Some(120)).unwrap();
        tracker.set_status(task.id, TaskStatus::Completed).unwrap();
        for _ in 0..10 {
            clock.advance(Duration::minutes(30));
            tracker.tick();
        }
        assert_eq!(tracker.companion().currency, 10);
    }

    let restarted = TrackerBuilder::new()
        .clock(clock.clone())
        .store(store.clone())
        .build();
    let companion = restarted.companion();
    assert_eq!(companion.currency, 10);
    assert_eq!(companion.experience, 5);
    assert_eq!(companion.level, 1);
    // tasks are session-scoped
    assert!(restarted.tasks().is_empty());
}

#[test]
fn missed_deadline_fails_once_then_retry_restarts_the_clock() {
    let clock = clock();
    let sink = Arc::new(RecordingSink::new());
    let mut tracker = TrackerBuilder::new()
        .clock(clock.clone())
        .sink(sink.clone())
        .build();
    let task = tracker.create("pay rent", Some(30)).unwrap();

    clock.advance(Duration::minutes(31));
    tracker.tick();
    tracker.tick();

    assert_eq!(
        tracker.tasks().get(task.id).unwrap().status,
        TaskStatus::Failed
    );
    assert_eq!(tracker.companion().health, 85);
    assert_eq!(
        sink.events(),
        vec![CompanionEvent::PenaltyApplied { health_delta: -15 }]
    );

    let retried = tracker.retry(task.id).unwrap();
    assert_eq!(retried.created_at, clock.now());
    assert_eq!(
        tracker.deadline_display(task.id),
        Some(DeadlineDisplay::Remaining {
            hours: 0,
            minutes: 30
        })
    );
}

#[rstest]
#[case::pending_to_paused(&[], TaskStatus::Paused, true)]
#[case::pending_to_completed(&[], TaskStatus::Completed, true)]
#[case::paused_to_pending(&[TaskStatus::Paused], TaskStatus::Pending, true)]
#[case::paused_to_completed(&[TaskStatus::Paused], TaskStatus::Completed, false)]
#[case::completed_to_pending(&[TaskStatus::Completed], TaskStatus::Pending, true)]
#[case::completed_to_paused(&[TaskStatus::Completed], TaskStatus::Paused, false)]
#[case::pending_to_failed(&[], TaskStatus::Failed, false)]
fn user_transitions(
    #[case] path: &[TaskStatus],
    #[case] target: TaskStatus,
    #[case] allowed: bool,
) {
    let mut tracker = TrackerBuilder::new().clock(clock()).build();
    let task = tracker.create("x", None).unwrap();
    for status in path {
        tracker.set_status(task.id, *status).unwrap();
    }

    let result = tracker.set_status(task.id, target);

    assert_eq!(result.is_ok(), allowed, "{result:?}");
}

#[test]
fn unaffordable_purchase_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()));
    let seeded = Companion {
        currency: 50,
        ..Companion::default()
    };
    store
        .put(COMPANION_KEY, &serde_json::to_value(&seeded).unwrap())
        .unwrap();
    let mut tracker = TrackerBuilder::new().store(store.clone()).build();

    let err = tracker.purchase_by_id("collar").unwrap_err();

    assert_eq!(
        err,
        PurchaseError::InsufficientFunds {
            price: 100,
            balance: 50
        }
    );
    assert_eq!(*tracker.companion(), seeded);
}

#[test]
fn health_potion_tops_up_to_max() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()));
    let seeded = Companion {
        currency: 50,
        health: 90,
        ..Companion::default()
    };
    store
        .put(COMPANION_KEY, &serde_json::to_value(&seeded).unwrap())
        .unwrap();
    let mut tracker = TrackerBuilder::new().store(store.clone()).build();

    tracker.purchase_by_id("health_potion").unwrap();

    let saved: Companion =
        serde_json::from_value(store.get(COMPANION_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(saved.currency, 0);
    assert_eq!(saved.health, 100);
}

#[test]
fn deleting_unknown_id_is_a_noop() {
    let mut tracker = TrackerBuilder::new().build();
    let kept = tracker.create("keep me", None).unwrap();
    tracker.delete(kept.id).unwrap();
    tracker.create("and me", None).unwrap();

    assert_eq!(tracker.delete(kept.id), Err(TaskError::NotFound(kept.id)));
    assert_eq!(tracker.tasks().len(), 1);
}
