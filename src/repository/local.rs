use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::filters::{self, FilterSpec};
use crate::models::Property;
use crate::repository::normalize::{Normalizer, StructuredNormalizer};
use crate::repository::traits::PropertyRepository;

/// Property backend held in process memory, seeded from a JSON file.
///
/// Supports local create/update/delete; changes are not written back to
/// the seed file.
pub struct LocalRepository {
    properties: RwLock<Vec<Property>>,
}

impl LocalRepository {
    pub fn new(properties: Vec<Property>) -> Self {
        Self {
            properties: RwLock::new(properties),
        }
    }

    /// Normalize raw records; records that cannot be normalized are skipped.
    pub fn from_records(records: Vec<Value>, normalizer: &dyn Normalizer) -> Self {
        let total = records.len();
        let properties: Vec<Property> = records
            .into_iter()
            .filter_map(|record| match normalizer.normalize(record) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Skipping record: {}", e);
                    None
                }
            })
            .collect();
        info!(
            "Loaded {} of {} records via {} normalizer",
            properties.len(),
            total,
            normalizer.name()
        );
        Self::new(properties)
    }

    /// Load a JSON array of records from `path`
    pub async fn from_seed_file(path: &Path, normalizer: &dyn Normalizer) -> Result<Self> {
        debug!("Reading seed data from {}", path.display());
        let raw = tokio::fs::read_to_string(path).await?;
        let records: Vec<Value> = serde_json::from_str(&raw)?;
        Ok(Self::from_records(records, normalizer))
    }

    /// Add a property. An empty id is replaced with a fresh one.
    pub async fn create(&self, mut property: Property) -> Result<Property> {
        if property.id.trim().is_empty() {
            property.id = uuid::Uuid::new_v4().to_string();
        }
        let mut properties = self.properties.write().await;
        if properties.iter().any(|p| p.id == property.id) {
            return Err(Error::Validation(format!(
                "property id already exists: {}",
                property.id
            )));
        }
        properties.push(property.clone());
        info!("Created property {}", property.id);
        Ok(property)
    }

    /// Merge the top-level fields of `patch` (canonical field names) into
    /// property `id`.
    ///
    /// The merged record is validated again; if that fails the stored
    /// property is left as it was. The id itself cannot be changed.
    pub async fn update(&self, id: &str, patch: Value) -> Result<Property> {
        let Value::Object(patch) = patch else {
            return Err(Error::invalid_record(Some(id), "patch is not a JSON object"));
        };
        let mut properties = self.properties.write().await;
        let slot = properties
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::not_found("property", id))?;

        let mut merged = match serde_json::to_value(&*slot)? {
            Value::Object(map) => map,
            _ => return Err(Error::invalid_record(Some(id), "stored property is not an object")),
        };
        for (key, value) in patch {
            if key != "id" {
                merged.insert(key, value);
            }
        }
        let updated = StructuredNormalizer.normalize(Value::Object(merged))?;
        *slot = updated.clone();
        info!("Updated property {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<Property> {
        let mut properties = self.properties.write().await;
        let index = properties
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::not_found("property", id))?;
        info!("Deleted property {}", id);
        Ok(properties.remove(index))
    }

    pub async fn len(&self) -> usize {
        self.properties.read().await.len()
    }
}

#[async_trait]
impl PropertyRepository for LocalRepository {
    async fn list_properties(&self, native: Option<&FilterSpec>) -> Result<Vec<Property>> {
        let properties = self.properties.read().await;
        Ok(match native {
            Some(spec) => filters::filter(properties.as_slice(), spec, ""),
            None => properties.clone(),
        })
    }

    async fn get_property(&self, id: &str) -> Result<Property> {
        self.properties
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found("property", id))
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
