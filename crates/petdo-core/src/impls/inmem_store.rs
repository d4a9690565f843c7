//! InMemoryStore - テスト・開発用の KeyValueStore

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::errors::StoreError;
use crate::ports::KeyValueStore;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, e.g. a corrupt record for load tests.
    pub fn with_entry(key: impl Into<String>, value: Value) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value);
        store
    }

    /// Number of keys written so far.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_then_get_overwrites() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.put("k", &json!({"a": 1})).unwrap();
        store.put("k", &json!({"a": 2})).unwrap();

        assert_eq!(store.get("k").unwrap(), Some(json!({"a": 2})));
        assert_eq!(store.len(), 1);
    }
}
