//! Status - 表示用スナップショット
//!
//! Read-only views handed to whatever renders the tracker. They are plain
//! owned data, so they can cross a `watch` channel or be dumped as JSON.

use serde::Serialize;

use crate::app::deadline::DeadlineDisplay;
use crate::domain::{Companion, Task, TaskId, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    #[serde(serialize_with = "display_id")]
    pub id: TaskId,
    pub text: String,
    pub status: TaskStatus,
    /// Present only while a deadline is running (pending or paused).
    pub deadline: Option<DeadlineDisplay>,
}

impl TaskView {
    pub fn new(task: &Task, deadline: Option<DeadlineDisplay>) -> Self {
        Self {
            id: task.id,
            text: task.text.clone(),
            status: task.status,
            deadline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerView {
    pub tasks: Vec<TaskView>,
    pub companion: Companion,
}

impl TrackerView {
    pub fn task(&self, id: TaskId) -> Option<&TaskView> {
        self.tasks.iter().find(|view| view.id == id)
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|view| view.status == status).count()
    }
}

fn display_id<S: serde::Serializer>(id: &TaskId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(id)
}
