//! JSON-file [`StateStore`].
//!
//! The whole state lives in one JSON object (`key -> value`). Writes go to
//! a sibling temp file that is then renamed over the original, so a failed
//! write never leaves a half-written state file behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use super::StateStore;
use crate::error::{Error, Result};

pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_object(&self) -> Result<Map<String, Value>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{} does not contain a JSON object", self.path.display()),
            ))),
        }
    }

    async fn persist(&self, object: &Map<String, Value>) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(object)?;
        let written = match tokio::fs::write(&tmp, body).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn init(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        if tokio::fs::try_exists(&self.path).await? {
            // Surface a corrupt file now rather than on first use
            self.load_object().await?;
        } else {
            debug!("Creating state file {}", self.path.display());
            self.persist(&Map::new()).await?;
        }
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Value>> {
        let mut object = self.load_object().await?;
        Ok(object.remove(key))
    }

    async fn write(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut object = self.load_object().await?;
        object.insert(key.to_string(), value);
        self.persist(&object).await?;
        debug!("Wrote '{}' to {}", key, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_creates_missing_file_and_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/state.json");
        let store = JsonFileStore::new(&path);
        store.init().await.unwrap();
        assert!(path.exists());
        assert!(store.read("anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("state.json"));
        store.init().await.unwrap();
        store.write("a", json!({"x": 1})).await.unwrap();
        store.write("b", json!([true])).await.unwrap();
        store.write("a", json!({"x": 2})).await.unwrap();

        let reopened = JsonFileStore::new(tmp.path().join("state.json"));
        assert_eq!(reopened.read("a").await.unwrap(), Some(json!({"x": 2})));
        assert_eq!(reopened.read("b").await.unwrap(), Some(json!([true])));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_temp_write_is_cleaned_up() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        let store = JsonFileStore::new(&path);
        store.init().await.unwrap();
        store.write("a", json!(1)).await.unwrap();

        // Temp path points into a directory that does not exist
        let temp_path = path.with_extension("json.tmp");
        std::os::unix::fs::symlink(tmp.path().join("missing/state.json"), &temp_path).unwrap();

        assert!(store.write("a", json!(2)).await.unwrap_err().is_io());
        assert!(std::fs::symlink_metadata(&temp_path).is_err());
        assert_eq!(store.read("a").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = JsonFileStore::new(&path);
        let err = store.init().await.unwrap_err();
        assert!(err.is_io());
    }
}
