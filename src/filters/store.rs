use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::Result;
use crate::filters::FilterSpec;
use crate::storage::{StateStore, SEARCH_FILTERS_KEY};

/// Last-used filter state, persisted across sessions
pub struct FilterSpecStore {
    store: Arc<dyn StateStore>,
    current: RwLock<FilterSpec>,
}

impl FilterSpecStore {
    /// Load the saved spec, merged over defaults.
    ///
    /// Storage failures propagate; a stored object that no longer parses is
    /// discarded in favor of defaults. A blank stored location means no
    /// location constraint.
    pub async fn load(store: Arc<dyn StateStore>) -> Result<Self> {
        let current = match store.read(SEARCH_FILTERS_KEY).await? {
            Some(value) => serde_json::from_value::<FilterSpec>(value).unwrap_or_else(|e| {
                warn!("Ignoring unreadable saved filters: {}", e);
                FilterSpec::default()
            }),
            None => FilterSpec::default(),
        };
        let current = clear_blank_location(current);

        Ok(Self {
            store,
            current: RwLock::new(current),
        })
    }

    pub async fn current(&self) -> FilterSpec {
        self.current.read().await.clone()
    }

    /// Persist `spec` as the last-used filter.
    pub async fn save(&self, spec: FilterSpec) -> Result<FilterSpec> {
        let spec = clear_blank_location(spec);
        let mut current = self.current.write().await;
        self.store
            .write(SEARCH_FILTERS_KEY, serde_json::to_value(&spec)?)
            .await?;
        info!("Saved filters ({} active)", spec.active_count());
        *current = spec.clone();
        Ok(spec)
    }

    /// Apply `edit` to the current spec and persist the result.
    pub async fn update<F>(&self, edit: F) -> Result<FilterSpec>
    where
        F: FnOnce(&mut FilterSpec),
    {
        let mut next = self.current().await;
        edit(&mut next);
        self.save(next).await
    }

    /// Restore and persist the default (unconstrained) spec.
    pub async fn reset(&self) -> Result<FilterSpec> {
        self.save(FilterSpec::default()).await
    }
}

fn clear_blank_location(mut spec: FilterSpec) -> FilterSpec {
    if spec.location.as_deref().is_some_and(|l| l.trim().is_empty()) {
        spec.location = None;
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;
    use crate::storage::MemoryStateStore;
    use serde_json::json;

    #[tokio::test]
    async fn starts_with_defaults() {
        let store = FilterSpecStore::load(Arc::new(MemoryStateStore::new())).await.unwrap();
        assert!(store.current().await.is_empty());
    }

    #[tokio::test]
    async fn saved_spec_survives_reload() {
        let backing = Arc::new(MemoryStateStore::new());
        let store = FilterSpecStore::load(backing.clone()).await.unwrap();
        store
            .update(|f| {
                f.bedrooms_min = Some(2);
                f.toggle_property_type(PropertyType::Condo);
            })
            .await
            .unwrap();

        let reloaded = FilterSpecStore::load(backing.clone()).await.unwrap();
        let spec = reloaded.current().await;
        assert_eq!(spec.bedrooms_min, Some(2));
        assert!(spec.property_types.contains(&PropertyType::Condo));

        let stored = backing.read(SEARCH_FILTERS_KEY).await.unwrap().unwrap();
        assert_eq!(stored["bedroomsMin"], json!(2));
    }

    #[tokio::test]
    async fn reset_persists_defaults() {
        let backing = Arc::new(MemoryStateStore::new());
        let store = FilterSpecStore::load(backing.clone()).await.unwrap();
        store.update(|f| f.location = Some("austin".into())).await.unwrap();
        store.reset().await.unwrap();
        let reloaded = FilterSpecStore::load(backing).await.unwrap();
        assert!(reloaded.current().await.is_empty());
    }

    #[tokio::test]
    async fn failed_save_keeps_current_spec() {
        let backing = Arc::new(MemoryStateStore::new());
        let store = FilterSpecStore::load(backing.clone()).await.unwrap();
        backing.set_fail_writes(true);
        let err = store.update(|f| f.price_max = Some(1.0)).await.unwrap_err();
        assert!(err.is_io());
        assert!(store.current().await.is_empty());
    }

    #[tokio::test]
    async fn blank_saved_location_is_unconstrained() {
        let backing = Arc::new(MemoryStateStore::new());
        backing
            .write(
                SEARCH_FILTERS_KEY,
                json!({"priceMin": null, "location": "", "propertyTypes": []}),
            )
            .await
            .unwrap();
        let store = FilterSpecStore::load(backing.clone()).await.unwrap();
        let spec = store.current().await;
        assert_eq!(spec.location, None);
        assert!(spec.is_empty());

        let saved = store.update(|f| f.location = Some("  ".into())).await.unwrap();
        assert_eq!(saved.active_count(), 0);
        let stored = backing.read(SEARCH_FILTERS_KEY).await.unwrap().unwrap();
        assert!(stored["location"].is_null());
    }

    #[tokio::test]
    async fn unreadable_saved_filters_fall_back_to_defaults() {
        let backing = Arc::new(MemoryStateStore::new());
        backing
            .write(SEARCH_FILTERS_KEY, json!({"priceMin": "cheap"}))
            .await
            .unwrap();
        let store = FilterSpecStore::load(backing).await.unwrap();
        assert!(store.current().await.is_empty());
    }
}
