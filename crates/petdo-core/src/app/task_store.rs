//! TaskStore - 順序付きタスク集合と名前付き操作
//!
//! # 設計
//! - The collection is an immutable `TaskSnapshot`; every successful action
//!   publishes a new one (copy-on-write), so observers holding an older
//!   snapshot never see it change under them.
//! - Every successful action also appends a `TaskChange` to an outbox.
//!   The tracker drains it into the deadline monitor and the deduplicator.
//! - Failed actions change nothing and report why via `TaskError`.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::domain::{Task, TaskChange, TaskError, TaskId, TaskStatus};

/// Immutable, versioned view of the task collection (insertion order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    version: u64,
    tasks: Arc<[Task]>,
}

impl TaskSnapshot {
    fn empty() -> Self {
        Self {
            version: 0,
            tasks: Arc::from(Vec::new()),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }
}

impl<'a> IntoIterator for &'a TaskSnapshot {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

#[derive(Debug)]
pub struct TaskStore {
    snapshot: TaskSnapshot,
    outbox: VecDeque<TaskChange>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            snapshot: TaskSnapshot::empty(),
            outbox: VecDeque::new(),
        }
    }

    /// Current snapshot (cheap clone: the task slice is shared).
    pub fn snapshot(&self) -> TaskSnapshot {
        self.snapshot.clone()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.snapshot.get(id)
    }

    /// Append a new pending task.
    pub fn create(
        &mut self,
        id: TaskId,
        text: &str,
        deadline_minutes: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<&Task, TaskError> {
        let task = Task::new(id, text, deadline_minutes, now)?;
        let mut tasks = self.snapshot.tasks.to_vec();
        tasks.push(task.clone());
        self.publish(tasks, TaskChange::Created(task));
        Ok(self.last())
    }

    /// Move a task along one edge of the state machine.
    ///
    /// `failed -> pending` is refused here: it must go through [`retry`]
    /// so the deadline anchor is reset.
    ///
    /// [`retry`]: TaskStore::retry
    pub fn set_status(&mut self, id: TaskId, target: TaskStatus) -> Result<&Task, TaskError> {
        let (index, current) = self.locate(id)?;
        if current.status == TaskStatus::Failed && target == TaskStatus::Pending {
            return Err(TaskError::ReservedTransition { id, to: target });
        }
        if !current.status.can_transition_to(target) {
            return Err(TaskError::InvalidTransition {
                id,
                from: current.status,
                to: target,
            });
        }
        let next = current.with_status(target);
        self.replace(index, next)
    }

    /// failed -> pending with a fresh deadline anchor.
    pub fn retry(&mut self, id: TaskId, now: DateTime<Utc>) -> Result<&Task, TaskError> {
        let (index, current) = self.locate(id)?;
        if current.status != TaskStatus::Failed {
            return Err(TaskError::InvalidTransition {
                id,
                from: current.status,
                to: TaskStatus::Pending,
            });
        }
        let next = current.retried(now);
        self.replace(index, next)
    }

    /// Remove a task from any status.
    pub fn delete(&mut self, id: TaskId) -> Result<Task, TaskError> {
        let (index, _) = self.locate(id)?;
        let mut tasks = self.snapshot.tasks.to_vec();
        let removed = tasks.remove(index);
        self.publish(tasks, TaskChange::Deleted(removed.clone()));
        Ok(removed)
    }

    /// Take all pending change notifications, oldest first.
    pub fn drain_changes(&mut self) -> Vec<TaskChange> {
        self.outbox.drain(..).collect()
    }

    fn locate(&self, id: TaskId) -> Result<(usize, &Task), TaskError> {
        self.snapshot
            .tasks
            .iter()
            .enumerate()
            .find(|(_, task)| task.id == id)
            .ok_or(TaskError::NotFound(id))
    }

    fn replace(&mut self, index: usize, next: Task) -> Result<&Task, TaskError> {
        let mut tasks = self.snapshot.tasks.to_vec();
        let from = tasks[index].status;
        tasks[index] = next.clone();
        self.publish(tasks, TaskChange::StatusChanged { task: next, from });
        Ok(&self.snapshot.tasks[index])
    }

    fn publish(&mut self, tasks: Vec<Task>, change: TaskChange) {
        self.snapshot = TaskSnapshot {
            version: self.snapshot.version + 1,
            tasks: Arc::from(tasks),
        };
        self.outbox.push_back(change);
    }

    fn last(&self) -> &Task {
        // publish() just pushed, so the slice is non-empty.
        &self.snapshot.tasks[self.snapshot.tasks.len() - 1]
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
