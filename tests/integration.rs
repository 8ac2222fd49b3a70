//! End-to-end tests over the JSON-file state store and the local backend.

use std::path::PathBuf;
use std::sync::Arc;

use home_finder::compare::{Attribute, ComparisonSelection};
use home_finder::filters::{price_range, FilterSpec};
use home_finder::models::PropertyType;
use home_finder::repository::{LocalRepository, PropertyRepository, RecordShape};
use home_finder::sort::SortKey;
use home_finder::storage::{JsonFileStore, StateStore, FAVORITES_KEY};
use home_finder::{filter_and_sort, HomeFinder};
use tempfile::TempDir;

fn seed_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/properties.json")
}

async fn open(tmp: &TempDir) -> HomeFinder {
    let normalizer = RecordShape::Structured.normalizer();
    let repository = LocalRepository::from_seed_file(&seed_path(), normalizer.as_ref())
        .await
        .unwrap();
    let state = JsonFileStore::new(tmp.path().join("state/state.json"));
    HomeFinder::open(Arc::new(repository), Arc::new(state))
        .await
        .unwrap()
}

fn ids<'a>(items: impl IntoIterator<Item = &'a home_finder::models::Property>) -> Vec<String> {
    items.into_iter().map(|p| p.id.clone()).collect()
}

#[tokio::test]
async fn seed_data_loads_and_featured_is_bounded() {
    let tmp = TempDir::new().unwrap();
    let finder = open(&tmp).await;
    let all = finder.repository().list_properties(None).await.unwrap();
    assert_eq!(all.len(), 5);

    let featured = finder.repository().featured().await.unwrap();
    assert_eq!(ids(&featured), ["1", "2", "4"]);
}

#[tokio::test]
async fn favorites_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    {
        let finder = open(&tmp).await;
        assert!(finder.toggle_favorite("2").await.unwrap().is_favorite);
        assert!(finder.toggle_favorite("5").await.unwrap().is_favorite);
        assert!(!finder.toggle_favorite("5").await.unwrap().is_favorite);
    }

    let finder = open(&tmp).await;
    let favorites = finder.favorites();
    assert!(favorites.is_favorite("2").await);
    assert!(!favorites.is_favorite("5").await);

    let state = JsonFileStore::new(tmp.path().join("state/state.json"));
    let raw = state.read(FAVORITES_KEY).await.unwrap().unwrap();
    assert_eq!(raw[0]["propertyId"], "2");
    assert!(raw[0]["savedAt"].is_string());
}

#[tokio::test]
async fn saved_filters_drive_browse_after_reopen() {
    let tmp = TempDir::new().unwrap();
    {
        let finder = open(&tmp).await;
        finder
            .filters()
            .update(|f| {
                f.apply_price_range(&price_range("$400K - $600K").unwrap());
            })
            .await
            .unwrap();
    }

    let finder = open(&tmp).await;
    let found = finder.browse("", SortKey::PriceDesc).await.unwrap();
    assert_eq!(ids(&found), ["2", "1"]);

    let searched = finder.browse("rooftop", SortKey::PriceAsc).await.unwrap();
    assert_eq!(ids(&searched), ["1"]);

    finder.filters().reset().await.unwrap();
    assert_eq!(finder.browse("", SortKey::PriceAsc).await.unwrap().len(), 5);
}

#[tokio::test]
async fn filter_and_sort_over_seed() {
    let tmp = TempDir::new().unwrap();
    let finder = open(&tmp).await;
    let all = finder.repository().list_properties(None).await.unwrap();

    let spec = FilterSpec {
        property_types: [PropertyType::House, PropertyType::SingleFamily]
            .into_iter()
            .collect(),
        bathrooms_min: Some(2.5),
        ..Default::default()
    };
    assert_eq!(ids(&filter_and_sort(&all, &spec, "", SortKey::SqftDesc)), ["5", "2"]);

    let texas_garages = filter_and_sort(&all, &FilterSpec::default(), "garage", SortKey::Newest);
    assert_eq!(ids(&texas_garages), ["5", "2"]);

    let by_location = FilterSpec {
        location: Some("aus".into()),
        ..Default::default()
    };
    assert_eq!(ids(&filter_and_sort(&all, &by_location, "", SortKey::PriceAsc)), ["1"]);
}

#[tokio::test]
async fn favorites_view_sorts_by_save_time() {
    let tmp = TempDir::new().unwrap();
    let finder = open(&tmp).await;
    for id in ["3", "1", "2"] {
        finder.toggle_favorite(id).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let newest = finder.saved_properties(SortKey::SavedNewest).await.unwrap();
    let newest_ids: Vec<_> = newest.iter().map(|s| s.property.id.as_str()).collect();
    assert_eq!(newest_ids, ["2", "1", "3"]);

    let oldest = finder.saved_properties(SortKey::SavedOldest).await.unwrap();
    let oldest_ids: Vec<_> = oldest.iter().map(|s| s.property.id.as_str()).collect();
    assert_eq!(oldest_ids, ["3", "1", "2"]);

    assert_eq!(finder.favorites().clear().await.unwrap(), 3);
    assert!(finder.saved_properties(SortKey::SavedNewest).await.unwrap().is_empty());
}

#[tokio::test]
async fn comparison_from_favorites() {
    let tmp = TempDir::new().unwrap();
    let finder = open(&tmp).await;

    let mut selection = ComparisonSelection::new();
    for id in ["1", "2", "3"] {
        let property = finder.repository().get_property(id).await.unwrap();
        selection.select(property).unwrap();
    }
    let extra = finder.repository().get_property("5").await.unwrap();
    assert!(selection.select(extra).unwrap_err().is_selection_full());
    assert_eq!(selection.len(), 3);

    let table = selection.table().unwrap();
    let best_of = |attribute: Attribute| -> Vec<String> {
        table
            .iter()
            .find(|r| r.attribute == attribute)
            .unwrap()
            .cells
            .iter()
            .filter(|c| c.is_best)
            .map(|c| c.property_id.clone())
            .collect()
    };
    assert_eq!(best_of(Attribute::Price), ["3"]);
    assert_eq!(best_of(Attribute::Bedrooms), ["2"]);
    assert_eq!(best_of(Attribute::YearBuilt), ["1"]);
    assert!(best_of(Attribute::Status).is_empty());

    let via_finder = finder.compare_selection(&["1", "2", "3"]).await.unwrap();
    assert_eq!(via_finder, table);

    for id in ["1", "2", "3", "5"] {
        finder.toggle_favorite(id).await.unwrap();
    }
    let from_favorites = finder.compare_favorites(&["1", "2", "3"]).await.unwrap();
    assert_eq!(from_favorites, table);
    let err = finder
        .compare_favorites(&["1", "2", "3", "5"])
        .await
        .unwrap_err();
    assert!(err.is_selection_full());
}
