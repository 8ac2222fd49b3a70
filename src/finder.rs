//! The surface presentation layers talk to.
//!
//! [`filter_and_sort`] is the single entry point for list views.
//! [`HomeFinder`] wires a property repository to the favorites and filter
//! stores, all sharing one injected [`StateStore`].

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::compare::{self, ComparisonRow, ComparisonSelection, MIN_COMPARISON};
use crate::error::{Error, Result};
use crate::favorites::FavoritesStore;
use crate::filters::{self, FilterSpec, FilterSpecStore};
use crate::models::{Listing, Property, SavedProperty};
use crate::repository::PropertyRepository;
use crate::sort::{self, SortKey};
use crate::storage::StateStore;

/// Narrow `listings` by `spec` and `search_term`, then order by `sort_key`.
pub fn filter_and_sort<T: Listing + Clone>(
    listings: &[T],
    spec: &FilterSpec,
    search_term: &str,
    sort_key: SortKey,
) -> Vec<T> {
    sort::sort(&filters::filter(listings, spec, search_term), sort_key)
}

/// Favorited state reported back to the view that toggled it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
    pub is_favorite: bool,
}

pub struct HomeFinder {
    repository: Arc<dyn PropertyRepository>,
    favorites: Arc<FavoritesStore>,
    filters: FilterSpecStore,
}

impl HomeFinder {
    /// Initialize `state` and load the persisted favorites and filters from it.
    pub async fn open(
        repository: Arc<dyn PropertyRepository>,
        state: Arc<dyn StateStore>,
    ) -> Result<Self> {
        state.init().await?;
        let favorites = Arc::new(FavoritesStore::load(state.clone()).await?);
        let filters = FilterSpecStore::load(state).await?;
        Ok(Self {
            repository,
            favorites,
            filters,
        })
    }

    pub fn repository(&self) -> &dyn PropertyRepository {
        self.repository.as_ref()
    }

    /// Shared handle for views that check favorited state per property
    pub fn favorites(&self) -> Arc<FavoritesStore> {
        self.favorites.clone()
    }

    pub fn filters(&self) -> &FilterSpecStore {
        &self.filters
    }

    /// Browse with the persisted filter. The repository may pre-filter, but
    /// the client-side filter always runs over what it returns.
    pub async fn browse(&self, search_term: &str, sort_key: SortKey) -> Result<Vec<Property>> {
        let spec = self.filters.current().await;
        let candidates = self.repository.list_properties(Some(&spec)).await?;
        Ok(filter_and_sort(&candidates, &spec, search_term, sort_key))
    }

    pub async fn toggle_favorite(&self, property_id: &str) -> Result<FavoriteStatus> {
        let toggled = self.favorites.toggle(property_id).await?;
        Ok(FavoriteStatus {
            is_favorite: toggled.is_favorite(),
        })
    }

    /// Favorited properties with their save times attached, sorted by
    /// `sort_key`. Favorites whose property has disappeared are skipped.
    pub async fn saved_properties(&self, sort_key: SortKey) -> Result<Vec<SavedProperty>> {
        let mut saved = Vec::new();
        for entry in self.favorites.list_all().await {
            match self.repository.get_property(&entry.property_id).await {
                Ok(property) => saved.push(SavedProperty {
                    property,
                    saved_at: Some(entry.saved_at),
                }),
                Err(e) if e.is_not_found() => {
                    warn!("Favorite {} no longer exists, skipping", entry.property_id);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(sort::sort(&saved, sort_key))
    }

    /// Favorited properties offered for comparison, most recently saved first
    pub async fn comparison_candidates(&self) -> Result<Vec<SavedProperty>> {
        self.saved_properties(SortKey::SavedNewest).await
    }

    /// Comparison table over favorites picked by id, in pick order.
    ///
    /// An id that is not a favorite is `NotFound`. Picking past the
    /// selection limit fails with `SelectionFull`; fewer than two distinct
    /// picks is a `Validation` error.
    pub async fn compare_favorites(&self, property_ids: &[&str]) -> Result<Vec<ComparisonRow>> {
        let candidates = self.comparison_candidates().await?;
        let mut selection = ComparisonSelection::new();
        for id in property_ids {
            let candidate = candidates
                .iter()
                .find(|c| c.property.id == *id)
                .ok_or_else(|| Error::not_found("favorite", *id))?;
            selection.select(candidate.property.clone())?;
        }
        selection.table().ok_or_else(|| {
            Error::Validation(format!(
                "pick at least {} favorites to compare",
                MIN_COMPARISON
            ))
        })
    }

    /// Comparison table for 2 to 3 properties, looked up by id
    pub async fn compare_selection(&self, property_ids: &[&str]) -> Result<Vec<ComparisonRow>> {
        let mut selected = Vec::with_capacity(property_ids.len());
        for id in property_ids {
            selected.push(self.repository.get_property(id).await?);
        }
        compare::compare(&selected)
    }
}
