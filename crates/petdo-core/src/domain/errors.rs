//! Errors - エラー型
//!
//! Every fallible operation leaves state untouched and reports why through
//! one of these enums. None of them is fatal to the tracker.

use thiserror::Error;

use super::ids::TaskId;
use super::task::TaskStatus;

/// Why a task operation was a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("task text is blank")]
    BlankText,

    #[error("deadline must be between 1 and 1440 minutes, got {0}")]
    DeadlineOutOfRange(u32),

    #[error("task {id} cannot go from {from} to {to}")]
    InvalidTransition {
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// The transition exists but is reserved for another actor
    /// (failure belongs to the deadline monitor, failed -> pending to retry).
    #[error("task {id}: transition to {to} is not available here")]
    ReservedTransition { id: TaskId, to: TaskStatus },
}

/// Why a shop purchase was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("unknown shop item: {0}")]
    UnknownItem(String),

    #[error("insufficient funds: price {price}, balance {balance}")]
    InsufficientFunds { price: u32, balance: u32 },
}

/// Key-value persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
