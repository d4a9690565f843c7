//! Events - ドメインイベント
//!
//! Three kinds of messages flow through the tracker:
//! - [`TaskChange`]: TaskStore -> DeadlineMonitor / EventDeduplicator
//! - [`PropagationEvent`]: EventDeduplicator -> CompanionEngine
//! - [`CompanionEvent`]: CompanionEngine -> EventSink (fire-and-forget)

use serde::Serialize;

use super::ids::TaskId;
use super::task::{Task, TaskStatus};

/// A successful TaskStore mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    Created(Task),
    StatusChanged {
        task: Task,
        from: TaskStatus,
    },
    Deleted(Task),
}

impl TaskChange {
    pub fn task(&self) -> &Task {
        match self {
            TaskChange::Created(task)
            | TaskChange::StatusChanged { task, .. }
            | TaskChange::Deleted(task) => task,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task().id
    }
}

/// Which terminal status a propagation event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationKind {
    Completed,
    Failed,
}

impl PropagationKind {
    pub fn status(self) -> TaskStatus {
        match self {
            PropagationKind::Completed => TaskStatus::Completed,
            PropagationKind::Failed => TaskStatus::Failed,
        }
    }
}

/// One-time notification that a task's entry into a terminal status should
/// affect the companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropagationEvent {
    pub task_id: TaskId,
    pub kind: PropagationKind,
}

/// Notifications for the animation collaborator. They never feed back
/// into core state, so sinks are free to drop them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompanionEvent {
    RewardGranted { coins: u32, experience: u32 },
    PenaltyApplied { health_delta: i32 },
    PurchaseMade { item: &'static str },
}
