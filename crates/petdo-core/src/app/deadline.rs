//! DeadlineMonitor - タスクごとの期限登録
//!
//! # 設計
//! - An arena of registrations keyed by TaskId. Each one is created and
//!   cancelled by task lifecycle changes (`sync`), never by a global timer.
//! - `tick(now)` only reports expiries; applying the failure is the
//!   tracker's job. An expired registration is removed in the same tick, so
//!   each expiry is requested exactly once.
//! - Resolution is whole minutes: `elapsed = floor((now - anchor) / 1min)`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::domain::{Task, TaskChange, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Registration {
    deadline_minutes: u32,
    anchor: DateTime<Utc>,
}

impl Registration {
    fn remaining_minutes(&self, now: DateTime<Utc>) -> i64 {
        let elapsed = (now - self.anchor).num_milliseconds().div_euclid(60_000);
        i64::from(self.deadline_minutes) - elapsed
    }
}

/// What a renderer shows next to a task with a running deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeadlineDisplay {
    Remaining { hours: u32, minutes: u32 },
    TimesUp,
}

impl DeadlineDisplay {
    fn from_remaining(remaining: i64) -> Self {
        if remaining <= 0 {
            return DeadlineDisplay::TimesUp;
        }
        let remaining = u32::try_from(remaining).unwrap_or(u32::MAX);
        DeadlineDisplay::Remaining {
            hours: remaining / 60,
            minutes: remaining % 60,
        }
    }
}

impl fmt::Display for DeadlineDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeadlineDisplay::Remaining { hours, minutes } => {
                write!(f, "{hours}h {minutes}m remaining")
            }
            DeadlineDisplay::TimesUp => f.write_str("Time's up!"),
        }
    }
}

#[derive(Debug, Default)]
pub struct DeadlineMonitor {
    registrations: HashMap<TaskId, Registration>,
}

impl DeadlineMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or cancel according to the task's latest state.
    pub fn sync(&mut self, change: &TaskChange) {
        match change {
            TaskChange::Created(task) | TaskChange::StatusChanged { task, .. } => {
                self.track(task)
            }
            TaskChange::Deleted(task) => self.cancel(task.id),
        }
    }

    fn track(&mut self, task: &Task) {
        match task.deadline_minutes {
            Some(deadline_minutes) if task.status.is_deadline_eligible() => {
                self.registrations.insert(
                    task.id,
                    Registration {
                        deadline_minutes,
                        anchor: task.created_at,
                    },
                );
            }
            _ => self.cancel(task.id),
        }
    }

    pub fn cancel(&mut self, id: TaskId) {
        self.registrations.remove(&id);
    }

    pub fn is_tracking(&self, id: TaskId) -> bool {
        self.registrations.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Evaluate every registration and return the ids whose time is up,
    /// oldest anchor first. Those registrations are dropped.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<TaskId> {
        self.expire_where(now, |_| true)
    }

    /// Same as [`tick`](Self::tick), restricted to `ids`. Used right after a
    /// registration is (re)created, since a reopened task keeps its old anchor
    /// and may already be overdue.
    pub fn tick_only(&mut self, ids: &[TaskId], now: DateTime<Utc>) -> Vec<TaskId> {
        self.expire_where(now, |id| ids.contains(id))
    }

    fn expire_where(
        &mut self,
        now: DateTime<Utc>,
        include: impl Fn(&TaskId) -> bool,
    ) -> Vec<TaskId> {
        let mut expired: Vec<(DateTime<Utc>, TaskId)> = self
            .registrations
            .iter()
            .filter(|(id, reg)| include(*id) && reg.remaining_minutes(now) <= 0)
            .map(|(id, reg)| (reg.anchor, *id))
            .collect();
        expired.sort();
        for (_, id) in &expired {
            self.registrations.remove(id);
        }
        expired.into_iter().map(|(_, id)| id).collect()
    }

    /// Remaining time for a tracked task. `None` when not tracked.
    pub fn display(&self, id: TaskId, now: DateTime<Utc>) -> Option<DeadlineDisplay> {
        self.registrations
            .get(&id)
            .map(|reg| DeadlineDisplay::from_remaining(reg.remaining_minutes(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use ulid::Ulid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    fn task(deadline: Option<u32>) -> Task {
        Task::new(TaskId::from_ulid(Ulid::new()), "x", deadline, t0()).unwrap()
    }

    #[test]
    fn only_tasks_with_deadline_are_tracked() {
        let mut monitor = DeadlineMonitor::new();
        let with = task(Some(30));
        let without = task(None);

        monitor.sync(&TaskChange::Created(with.clone()));
        monitor.sync(&TaskChange::Created(without.clone()));

        assert!(monitor.is_tracking(with.id));
        assert!(!monitor.is_tracking(without.id));
    }

    #[test]
    fn paused_tasks_stay_tracked() {
        let mut monitor = DeadlineMonitor::new();
        let t = task(Some(30));
        monitor.sync(&TaskChange::Created(t.clone()));

        monitor.sync(&TaskChange::StatusChanged {
            task: t.with_status(TaskStatus::Paused),
            from: TaskStatus::Pending,
        });

        assert!(monitor.is_tracking(t.id));
    }

    #[rstest]
    #[case::completed(TaskStatus::Completed)]
    #[case::failed(TaskStatus::Failed)]
    fn leaving_eligible_status_cancels(#[case] status: TaskStatus) {
        let mut monitor = DeadlineMonitor::new();
        let t = task(Some(30));
        monitor.sync(&TaskChange::Created(t.clone()));

        monitor.sync(&TaskChange::StatusChanged {
            task: t.with_status(status),
            from: TaskStatus::Pending,
        });

        assert!(!monitor.is_tracking(t.id));
        assert!(monitor.tick(t0() + Duration::days(2)).is_empty());
    }

    #[test]
    fn delete_cancels() {
        let mut monitor = DeadlineMonitor::new();
        let t = task(Some(30));
        monitor.sync(&TaskChange::Created(t.clone()));
        monitor.sync(&TaskChange::Deleted(t.clone()));
        assert!(monitor.is_empty());
    }

    #[rstest]
    #[case::fresh(0, false)]
    #[case::one_minute_left(29, false)]
    #[case::just_under(30 * 60 - 1, false)]
    #[case::exactly_due(30 * 60, true)]
    #[case::overdue(31 * 60, true)]
    fn expiry_boundary(#[case] elapsed_secs: i64, #[case] expired: bool) {
        let mut monitor = DeadlineMonitor::new();
        let t = task(Some(30));
        monitor.sync(&TaskChange::Created(t.clone()));

        let result = monitor.tick(t0() + Duration::seconds(elapsed_secs));

        assert_eq!(result == vec![t.id], expired);
    }

    #[test]
    fn expiry_is_reported_once() {
        let mut monitor = DeadlineMonitor::new();
        let t = task(Some(30));
        monitor.sync(&TaskChange::Created(t.clone()));
        let late = t0() + Duration::minutes(31);

        assert_eq!(monitor.tick(late), vec![t.id]);
        assert!(monitor.tick(late).is_empty());
        assert!(monitor.tick(late + Duration::minutes(1)).is_empty());
    }

    #[test]
    fn retry_re_registers_with_new_anchor() {
        let mut monitor = DeadlineMonitor::new();
        let t = task(Some(30));
        monitor.sync(&TaskChange::Created(t.clone()));
        let late = t0() + Duration::minutes(31);
        monitor.tick(late);

        let retried = t.with_status(TaskStatus::Failed).retried(late);
        monitor.sync(&TaskChange::StatusChanged {
            task: retried.clone(),
            from: TaskStatus::Failed,
        });

        assert_eq!(
            monitor.display(t.id, late),
            Some(DeadlineDisplay::Remaining {
                hours: 0,
                minutes: 30
            })
        );
    }

    #[test]
    fn tick_only_ignores_other_registrations() {
        let mut monitor = DeadlineMonitor::new();
        let a = task(Some(10));
        let b = task(Some(10));
        monitor.sync(&TaskChange::Created(a.clone()));
        monitor.sync(&TaskChange::Created(b.clone()));
        let late = t0() + Duration::minutes(15);

        assert_eq!(monitor.tick_only(&[b.id], late), vec![b.id]);
        assert!(monitor.is_tracking(a.id));
        assert!(!monitor.is_tracking(b.id));
    }

    #[test]
    fn display_formats_hours_and_minutes() {
        let mut monitor = DeadlineMonitor::new();
        let t = task(Some(125));
        monitor.sync(&TaskChange::Created(t.clone()));

        let shown = monitor.display(t.id, t0() + Duration::seconds(30)).unwrap();
        assert_eq!(shown.to_string(), "2h 5m remaining");

        let shown = monitor.display(t.id, t0() + Duration::minutes(200)).unwrap();
        assert_eq!(shown, DeadlineDisplay::TimesUp);
        assert_eq!(shown.to_string(), "Time's up!");
    }

    #[test]
    fn multiple_expiries_come_out_oldest_first() {
        let mut monitor = DeadlineMonitor::new();
        let older = task(Some(10));
        let mut newer = task(Some(10));
        newer.created_at = t0() + Duration::minutes(1);
        monitor.sync(&TaskChange::Created(newer.clone()));
        monitor.sync(&TaskChange::Created(older.clone()));

        let expired = monitor.tick(t0() + Duration::hours(1));

        assert_eq!(expired, vec![older.id, newer.id]);
    }
}
