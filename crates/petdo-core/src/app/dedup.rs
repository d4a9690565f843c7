//! EventDeduplicator - 完了・失敗をちょうど 1 回だけ伝える
//!
//! The seen-set holds `(TaskId, PropagationKind)` pairs already forwarded.
//! Invariant: a pair is in the set iff the task currently sits in that
//! terminal status and its entry has been propagated. Leaving the status (or
//! being deleted) clears the pair, so the next entry counts as a new event.

use std::collections::HashSet;

use crate::app::task_store::TaskSnapshot;
use crate::domain::{PropagationEvent, PropagationKind, TaskChange, TaskId, TaskStatus};

#[derive(Debug, Default)]
pub struct EventDeduplicator {
    seen: HashSet<(TaskId, PropagationKind)>,
}

impl EventDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// One observation: at most one completion and at most one failure,
    /// each the first unseen task in collection order. Re-observe until
    /// this returns an empty vec to drain simultaneous transitions.
    pub fn observe(&mut self, snapshot: &TaskSnapshot) -> Vec<PropagationEvent> {
        [PropagationKind::Completed, PropagationKind::Failed]
            .into_iter()
            .filter_map(|kind| self.first_unseen(snapshot, kind))
            .collect()
    }

    fn first_unseen(
        &mut self,
        snapshot: &TaskSnapshot,
        kind: PropagationKind,
    ) -> Option<PropagationEvent> {
        let status = kind.status();
        let task = snapshot
            .iter()
            .find(|task| task.status == status && !self.seen.contains(&(task.id, kind)))?;
        self.seen.insert((task.id, kind));
        Some(PropagationEvent {
            task_id: task.id,
            kind,
        })
    }

    /// Re-arm markers for tasks that left a terminal status.
    pub fn on_change(&mut self, change: &TaskChange) {
        match change {
            TaskChange::Created(_) => {}
            TaskChange::StatusChanged { task, from } => {
                if *from != task.status {
                    self.clear(task.id, *from);
                }
            }
            TaskChange::Deleted(task) => {
                self.seen.remove(&(task.id, PropagationKind::Completed));
                self.seen.remove(&(task.id, PropagationKind::Failed));
            }
        }
    }

    fn clear(&mut self, id: TaskId, left: TaskStatus) {
        let kind = match left {
            TaskStatus::Completed => PropagationKind::Completed,
            TaskStatus::Failed => PropagationKind::Failed,
            TaskStatus::Pending | TaskStatus::Paused => return,
        };
        self.seen.remove(&(id, kind));
    }

    pub fn has_seen(&self, id: TaskId, kind: PropagationKind) -> bool {
        self.seen.contains(&(id, kind))
    }

    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }
}
