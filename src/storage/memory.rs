//! In-memory [`StateStore`] for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use super::StateStore;
use crate::error::{Error, Result};

pub struct MemoryStateStore {
    values: RwLock<HashMap<String, Value>>,
    fail_writes: AtomicBool,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent write fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn poisoned() -> Error {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "state store lock poisoned",
        ))
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Value>> {
        let values = self.values.read().map_err(|_| Self::poisoned())?;
        Ok(values.get(key).cloned())
    }

    async fn write(&self, key: &str, value: Value) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("simulated write failure for '{}'", key),
            )));
        }
        let mut values = self.values.write().map_err(|_| Self::poisoned())?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn read_returns_what_was_written() {
        let store = MemoryStateStore::new();
        assert!(store.read("k").await.unwrap().is_none());
        store.write("k", json!([1, 2])).await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), Some(json!([1, 2])));
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_value() {
        let store = MemoryStateStore::new();
        store.write("k", json!("old")).await.unwrap();
        store.set_fail_writes(true);
        let err = store.write("k", json!("new")).await.unwrap_err();
        assert!(err.is_io());
        assert_eq!(store.read("k").await.unwrap(), Some(json!("old")));
    }
}
