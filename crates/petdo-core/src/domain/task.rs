//! Task - タスクと状態遷移
//!
//! - `TaskStatus`: 4 状態と遷移表（`can_transition_to`）
//! - `Task`: 値オブジェクト。遷移は新しい `Task` を返す
//! - `validate_deadline` / `deadline_from_parts`: 期限（分）の検証と入力フォーム変換
//!
//! 時計もストレージも持たない純粋なモジュール。時刻は呼び出し側が渡す。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::TaskError;
use super::ids::TaskId;

/// 期限の上限（24 時間 = 1440 分）
pub const MAX_DEADLINE_MINUTES: u32 = 24 * 60;

/// TaskStatus はタスクの状態を表現
///
/// # 状態遷移
/// - pending <-> paused: 何度でも往復できる
/// - pending -> completed -> pending: 完了と再オープン
/// - pending | paused -> failed: 期限切れのときだけ（DeadlineMonitor 経由）
/// - failed -> pending: retry。期限の起点（`created_at`）もリセットされる
///
/// 削除は状態ではない。タスクはコレクションから外れるだけ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Paused,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Is `self -> next` an edge of the state machine?
    ///
    /// `Failed -> Pending` is listed here, but callers reach it only through
    /// retry because it also resets `created_at`.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Paused)
                | (Paused, Pending)
                | (Pending, Completed)
                | (Completed, Pending)
                | (Pending, Failed)
                | (Paused, Failed)
                | (Failed, Pending)
        )
    }

    /// この状態で期限が進むか
    ///
    /// paused でも期限は止まらない。
    pub fn is_deadline_eligible(self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Paused)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Paused => "paused",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task は追跡対象の 1 件
///
/// 値として扱う: 遷移は同じ `id` を持つ新しい `Task` を作り、
/// 現在のスナップショットが持つものは書き換えない。
///
/// # フィールド
/// - `text`: 前後の空白を除いた本文（空は不可）
/// - `deadline_minutes`: 1..=1440、`None` なら期限なし
/// - `created_at`: 期限の起点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_minutes: Option<u32>,
    /// 期限の起点。retry でだけリセットされる
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// 本文と期限を検証して pending のタスクを作る
    pub fn new(
        id: TaskId,
        text: &str,
        deadline_minutes: Option<u32>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TaskError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TaskError::BlankText);
        }
        if let Some(minutes) = deadline_minutes {
            validate_deadline(minutes)?;
        }
        Ok(Self {
            id,
            text: text.to_string(),
            status: TaskStatus::Pending,
            deadline_minutes,
            created_at,
        })
    }

    /// Copy of this task with a different status.
    pub fn with_status(&self, status: TaskStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Copy of this task re-entering pending with a fresh deadline anchor.
    pub fn retried(&self, now: DateTime<Utc>) -> Self {
        Self {
            status: TaskStatus::Pending,
            created_at: now,
            ..self.clone()
        }
    }
}

/// 1..=1440 分以外は `DeadlineOutOfRange`
pub fn validate_deadline(minutes: u32) -> Result<(), TaskError> {
    if minutes == 0 || minutes > MAX_DEADLINE_MINUTES {
        return Err(TaskError::DeadlineOutOfRange(minutes));
    }
    Ok(())
}

/// 入力フォームの「時間 / 分」を期限（分）に変換する
///
/// - 時間は 0..=24、分は 0..=59 に丸める
/// - 合計 0 は「期限なし」（`None`）
/// - 24 時間を超える分は [`MAX_DEADLINE_MINUTES`] で頭打ち
pub fn deadline_from_parts(hours: u32, minutes: u32) -> Option<u32> {
    let total = hours.min(24) * 60 + minutes.min(59);
    match total {
        0 => None,
        t => Some(t.min(MAX_DEADLINE_MINUTES)),
    }
}
