//! Runtime host - Tracker を 1 つの tokio タスクで動かす
//!
//! - コマンドは mpsc で受け取り、結果は oneshot で返す
//! - `interval` で deadline を定期評価（デフォルト 1 分）
//! - コマンド / tick のたびに `TrackerView` を watch で配信
//! - shutdown は watch で通知し、`shutdown_and_join()` で Tracker を回収
//!
//! Tracker は単一タスクが所有するので、ドメイン状態にロックは不要。

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::app::status::TrackerView;
use crate::app::tracker::Tracker;
use crate::domain::{Companion, PurchaseError, Task, TaskError, TaskId, TaskStatus};

const COMMAND_BUFFER: usize = 64;
/// `interval` panics on zero.
const MIN_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Purchase(#[from] PurchaseError),

    #[error("tracker runtime has stopped")]
    Stopped,
}

enum Command {
    Create {
        text: String,
        deadline_minutes: Option<u32>,
        reply: oneshot::Sender<Result<Task, TaskError>>,
    },
    SetStatus {
        id: TaskId,
        target: TaskStatus,
        reply: oneshot::Sender<Result<Task, TaskError>>,
    },
    Retry {
        id: TaskId,
        reply: oneshot::Sender<Result<Task, TaskError>>,
    },
    Delete {
        id: TaskId,
        reply: oneshot::Sender<Result<Task, TaskError>>,
    },
    Purchase {
        item_id: String,
        reply: oneshot::Sender<Result<Companion, PurchaseError>>,
    },
    Tick {
        reply: oneshot::Sender<Vec<TaskId>>,
    },
}

/// Cloneable front door to a running tracker.
#[derive(Clone)]
pub struct TrackerHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<TrackerView>,
}

impl TrackerHandle {
    pub async fn create(
        &self,
        text: impl Into<String>,
        deadline_minutes: Option<u32>,
    ) -> Result<Task, RuntimeError> {
        let text = text.into();
        Ok(self
            .request(|reply| Command::Create {
                text,
                deadline_minutes,
                reply,
            })
            .await??)
    }

    pub async fn set_status(&self, id: TaskId, target: TaskStatus) -> Result<Task, RuntimeError> {
        Ok(self
            .request(|reply| Command::SetStatus { id, target, reply })
            .await??)
    }

    pub async fn retry(&self, id: TaskId) -> Result<Task, RuntimeError> {
        Ok(self.request(|reply| Command::Retry { id, reply }).await??)
    }

    pub async fn delete(&self, id: TaskId) -> Result<Task, RuntimeError> {
        Ok(self.request(|reply| Command::Delete { id, reply }).await??)
    }

    pub async fn purchase(&self, item_id: impl Into<String>) -> Result<Companion, RuntimeError> {
        let item_id = item_id.into();
        Ok(self
            .request(|reply| Command::Purchase { item_id, reply })
            .await??)
    }

    /// Force a deadline evaluation now instead of waiting for the interval.
    pub async fn tick(&self) -> Result<Vec<TaskId>, RuntimeError> {
        self.request(|reply| Command::Tick { reply }).await
    }

    /// Latest published view.
    pub fn view(&self) -> TrackerView {
        self.view.borrow().clone()
    }

    /// A receiver that wakes on every new view.
    pub fn subscribe(&self) -> watch::Receiver<TrackerView> {
        let mut rx = self.view.clone();
        rx.mark_unchanged();
        rx
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<R>) -> Command,
    ) -> Result<R, RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        reply_rx.await.map_err(|_| RuntimeError::Stopped)
    }
}

/// Running tracker task.
/// - `request_shutdown()` でループを止める
/// - `shutdown_and_join()` で終了を待ち、Tracker を返す
pub struct TrackerRuntime {
    handle: TrackerHandle,
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<Tracker>,
}

impl TrackerRuntime {
    pub fn spawn(tracker: Tracker, tick_interval: Duration) -> Self {
        let tick_interval = tick_interval.max(MIN_TICK_INTERVAL);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view_rx) = watch::channel(tracker.view());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(run(tracker, commands_rx, view_tx, shutdown_rx, tick_interval));

        Self {
            handle: TrackerHandle {
                commands: commands_tx,
                view: view_rx,
            },
            shutdown_tx,
            join,
        }
    }

    pub fn handle(&self) -> TrackerHandle {
        self.handle.clone()
    }

    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Stop the loop and take the tracker back. `None` if the task panicked.
    pub async fn shutdown_and_join(self) -> Option<Tracker> {
        self.request_shutdown();
        match self.join.await {
            Ok(tracker) => Some(tracker),
            Err(err) => {
                tracing::warn!(error = %err, "tracker task did not finish cleanly");
                None
            }
        }
    }
}

async fn run(
    mut tracker: Tracker,
    mut commands: mpsc::Receiver<Command>,
    view_tx: watch::Sender<TrackerView>,
    mut shutdown_rx: watch::Receiver<bool>,
    tick_interval: Duration,
) -> Tracker {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::debug!(interval_secs = tick_interval.as_secs(), "tracker runtime started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                // sender dropped counts as shutdown
                if changed.is_err() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {
                tracker.tick();
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                apply(&mut tracker, command);
            }
        }

        view_tx.send_replace(tracker.view());
    }

    tracing::debug!("tracker runtime stopped");
    tracker
}

fn apply(tracker: &mut Tracker, command: Command) {
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        Command::Create {
            text,
            deadline_minutes,
            reply,
        } => {
            let _ = reply.send(tracker.create(&text, deadline_minutes));
        }
        Command::SetStatus { id, target, reply } => {
            let _ = reply.send(tracker.set_status(id, target));
        }
        Command::Retry { id, reply } => {
            let _ = reply.send(tracker.retry(id));
        }
        Command::Delete { id, reply } => {
            let _ = reply.send(tracker.delete(id));
        }
        Command::Purchase { item_id, reply } => {
            let _ = reply.send(tracker.purchase_by_id(&item_id).cloned());
        }
        Command::Tick { reply } => {
            let _ = reply.send(tracker.tick());
        }
    }
}
