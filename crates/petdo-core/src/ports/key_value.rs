//! KeyValueStore port - 永続化の抽象化
//!
//! The core only ever needs "read at startup, overwrite on change", so the
//! port is a plain get/put of JSON values under string keys.

use serde_json::Value;

use crate::domain::errors::StoreError;

/// Key under which the companion record is stored.
pub const COMPANION_KEY: &str = "companion";

pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored under `key` yet.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Whole-value overwrite.
    fn put(&self, key: &str, value: &Value) -> Result<(), StoreError>;
}
