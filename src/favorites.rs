//! Favorited-property set, persisted through a [`StateStore`].
//!
//! The store keeps an in-memory mirror of the persisted entries. Every
//! mutation builds the next entry list, writes it, and only then swaps the
//! mirror, so a failed write leaves both sides untouched. All views share
//! one `FavoritesStore` (behind an `Arc`) and query it per property, which
//! keeps favorited state consistent without a live subscription.
//!
//! `toggle` is a read-then-write composite. Two toggles on the same id are
//! serialized through a per-id async mutex; toggles on different ids run
//! independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::FavoriteEntry;
use crate::storage::{StateStore, FAVORITES_KEY};

/// Outcome of a toggle
#[derive(Debug, Clone, PartialEq)]
pub enum Toggled {
    Added(FavoriteEntry),
    Removed(FavoriteEntry),
}

impl Toggled {
    /// Favorited state after the toggle
    pub fn is_favorite(&self) -> bool {
        matches!(self, Toggled::Added(_))
    }

    pub fn entry(&self) -> &FavoriteEntry {
        match self {
            Toggled::Added(e) | Toggled::Removed(e) => e,
        }
    }
}

pub struct FavoritesStore {
    store: Arc<dyn StateStore>,
    entries: RwLock<Vec<FavoriteEntry>>,
    toggle_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl FavoritesStore {
    /// Load the persisted favorites. A store with nothing written yet
    /// starts empty; unreadable data is an error.
    pub async fn load(store: Arc<dyn StateStore>) -> Result<Self> {
        let entries = match store.read(FAVORITES_KEY).await? {
            Some(value) => serde_json::from_value::<Vec<FavoriteEntry>>(value)?,
            None => Vec::new(),
        };
        let entries = dedupe(entries);
        debug!("Loaded {} favorites", entries.len());

        Ok(Self {
            store,
            entries: RwLock::new(entries),
            toggle_locks: Mutex::new(HashMap::new()),
        })
    }

    /// True iff `property_id` is favorited. Unknown ids are simply not favorited.
    pub async fn is_favorite(&self, property_id: &str) -> bool {
        self.entries
            .read()
            .await
            .iter()
            .any(|e| e.property_id == property_id)
    }

    pub async fn get(&self, property_id: &str) -> Result<FavoriteEntry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.property_id == property_id)
            .cloned()
            .ok_or_else(|| Error::not_found("favorite", property_id))
    }

    /// Favorite `property_id`. Idempotent: an existing entry is returned
    /// unchanged, keeping its original `saved_at`.
    pub async fn add(&self, property_id: &str) -> Result<FavoriteEntry> {
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.iter().find(|e| e.property_id == property_id) {
            return Ok(existing.clone());
        }

        let entry = FavoriteEntry {
            property_id: property_id.to_string(),
            saved_at: Utc::now(),
        };
        let mut next = entries.clone();
        next.push(entry.clone());
        self.persist(&next).await?;
        *entries = next;

        info!("Favorited property {}", property_id);
        Ok(entry)
    }

    /// Unfavorite `property_id`, returning the removed entry.
    pub async fn remove(&self, property_id: &str) -> Result<FavoriteEntry> {
        let mut entries = self.entries.write().await;
        let index = entries
            .iter()
            .position(|e| e.property_id == property_id)
            .ok_or_else(|| Error::not_found("favorite", property_id))?;

        let mut next = entries.clone();
        let removed = next.remove(index);
        self.persist(&next).await?;
        *entries = next;

        info!("Unfavorited property {}", property_id);
        Ok(removed)
    }

    /// Flip the favorited state of `property_id`.
    pub async fn toggle(&self, property_id: &str) -> Result<Toggled> {
        let lock = self.toggle_lock(property_id);
        let _guard = lock.mutex.lock().await;
        if self.is_favorite(property_id).await {
            self.remove(property_id).await.map(Toggled::Removed)
        } else {
            self.add(property_id).await.map(Toggled::Added)
        }
    }

    /// Snapshot of all entries, in the order they were saved
    pub async fn list_all(&self) -> Vec<FavoriteEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Remove every favorite in a single write. Returns how many were removed.
    pub async fn clear(&self) -> Result<usize> {
        let mut entries = self.entries.write().await;
        if entries.is_empty() {
            return Ok(0);
        }
        self.persist(&[]).await?;
        let removed = entries.len();
        entries.clear();
        info!("Cleared {} favorites", removed);
        Ok(removed)
    }

    async fn persist(&self, entries: &[FavoriteEntry]) -> Result<()> {
        let value: Value = serde_json::to_value(entries)?;
        self.store.write(FAVORITES_KEY, value).await
    }

    fn toggle_lock<'a>(&'a self, property_id: &'a str) -> ToggleLock<'a> {
        let mut locks = self
            .toggle_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mutex = locks
            .entry(property_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        ToggleLock {
            locks: &self.toggle_locks,
            property_id,
            mutex,
        }
    }
}

/// Handle on one id's toggle mutex. Dropping the last handle removes the
/// map entry, whether the toggle finished or its future was dropped early.
struct ToggleLock<'a> {
    locks: &'a Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    property_id: &'a str,
    mutex: Arc<AsyncMutex<()>>,
}

impl Drop for ToggleLock<'_> {
    fn drop(&mut self) {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Only the map and this handle still own the mutex
        let last = locks
            .get(self.property_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &self.mutex) && Arc::strong_count(entry) == 2);
        if last {
            locks.remove(self.property_id);
        }
    }
}

/// Collapse duplicate ids left by older writers, keeping the first entry.
fn dedupe(entries: Vec<FavoriteEntry>) -> Vec<FavoriteEntry> {
    let mut seen = std::collections::HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.property_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStateStore;
    use serde_json::json;
    use std::time::Duration;

    /// State store whose writes take `delay`
    struct SlowStore {
        inner: MemoryStateStore,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl StateStore for SlowStore {
        async fn init(&self) -> Result<()> {
            self.inner.init().await
        }

        async fn read(&self, key: &str) -> Result<Option<Value>> {
            self.inner.read(key).await
        }

        async fn write(&self, key: &str, value: Value) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            self.inner.write(key, value).await
        }
    }

    async fn slow(delay: Duration) -> FavoritesStore {
        let backing = Arc::new(SlowStore {
            inner: MemoryStateStore::new(),
            delay,
        });
        FavoritesStore::load(backing).await.unwrap()
    }

    async fn fresh() -> (Arc<MemoryStateStore>, FavoritesStore) {
        let backing = Arc::new(MemoryStateStore::new());
        let store = FavoritesStore::load(backing.clone()).await.unwrap();
        (backing, store)
    }

    #[tokio::test]
    async fn unknown_id_is_not_favorite() {
        let (_, store) = fresh().await;
        assert!(!store.is_favorite("nope").await);
    }

    #[tokio::test]
    async fn add_twice_keeps_first_saved_at() {
        let (_, store) = fresh().await;
        let first = store.add("p1").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.add("p1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list_all().await.len(), 1);
        assert_eq!(store.get("p1").await.unwrap().saved_at, first.saved_at);
    }

    #[tokio::test]
    async fn remove_unknown_is_not_found() {
        let (_, store) = fresh().await;
        let err = store.remove("ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn double_toggle_restores_membership() {
        let (_, store) = fresh().await;
        let on = store.toggle("p1").await.unwrap();
        assert!(on.is_favorite());
        assert!(store.is_favorite("p1").await);

        let off = store.toggle("p1").await.unwrap();
        assert!(!off.is_favorite());
        assert_eq!(off.entry().property_id, "p1");
        assert!(!store.is_favorite("p1").await);
    }

    #[tokio::test]
    async fn concurrent_toggles_on_same_id_are_serialized() {
        let (_, store) = fresh().await;
        let store = Arc::new(store);

        let a = tokio::spawn({
            let store = store.clone();
            async move { store.toggle("p1").await }
        });
        let b = tokio::spawn({
            let store = store.clone();
            async move { store.toggle("p1").await }
        });
        let ra = a.await.unwrap().unwrap();
        let rb = b.await.unwrap().unwrap();

        // One added, the other removed: never two adds or a failed remove.
        assert_ne!(ra.is_favorite(), rb.is_favorite());
        assert!(!store.is_favorite("p1").await);
        assert!(store.toggle_locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_toggles_release_their_locks() {
        let store = slow(Duration::from_millis(50)).await;
        for i in 0..20 {
            let id = format!("p{}", i);
            let outcome = tokio::time::timeout(Duration::from_millis(5), store.toggle(&id)).await;
            assert!(outcome.is_err());
        }
        assert!(store.toggle_locks.lock().unwrap().is_empty());
        // Cancelled before the write finished, so nothing was committed
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn cancelled_waiter_leaves_lock_to_the_holder() {
        let store = Arc::new(slow(Duration::from_millis(50)).await);
        let holder = tokio::spawn({
            let store = store.clone();
            async move { store.toggle("p1").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let waiter = tokio::time::timeout(Duration::from_millis(5), store.toggle("p1")).await;
        assert!(waiter.is_err());
        assert_eq!(store.toggle_locks.lock().unwrap().len(), 1);

        assert!(holder.await.unwrap().unwrap().is_favorite());
        assert!(store.toggle_locks.lock().unwrap().is_empty());
        assert!(store.is_favorite("p1").await);
    }

    #[tokio::test]
    async fn failed_write_leaves_state_untouched() {
        let (backing, store) = fresh().await;
        store.add("keep").await.unwrap();
        backing.set_fail_writes(true);

        assert!(store.add("new").await.unwrap_err().is_io());
        assert!(store.remove("keep").await.unwrap_err().is_io());
        assert!(store.clear().await.unwrap_err().is_io());

        assert!(store.is_favorite("keep").await);
        assert!(!store.is_favorite("new").await);
        let persisted = backing.read(FAVORITES_KEY).await.unwrap().unwrap();
        assert_eq!(persisted.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn load_reads_camel_case_entries_and_drops_duplicates() {
        let backing = Arc::new(MemoryStateStore::new());
        backing
            .write(
                FAVORITES_KEY,
                json!([
                    {"propertyId": "1", "savedAt": "2024-01-02T00:00:00Z"},
                    {"propertyId": "1", "savedAt": "2024-03-02T00:00:00Z"},
                    {"propertyId": "2", "savedAt": "2024-02-02T00:00:00Z"}
                ]),
            )
            .await
            .unwrap();

        let store = FavoritesStore::load(backing).await.unwrap();
        let all = store.list_all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].saved_at.to_rfc3339(), "2024-01-02T00:00:00+00:00");
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let (backing, store) = fresh().await;
        store.add("a").await.unwrap();
        store.add("b").await.unwrap();
        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.is_empty().await);
        assert_eq!(backing.read(FAVORITES_KEY).await.unwrap(), Some(json!([])));
    }
}
