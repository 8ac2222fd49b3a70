use crate::error::Result;
use crate::filters::FilterSpec;
use crate::models::Property;
use async_trait::async_trait;

/// Most featured listings returned by [`PropertyRepository::featured`]
pub const FEATURED_LIMIT: usize = 6;

/// Common trait for all property backends.
///
/// Backends always hand out canonical [`Property`] records. A backend may
/// push a [`FilterSpec`] down to its storage, but callers still run the
/// client-side filter over the result: backend filtering is not guaranteed
/// to be complete (free-text matching in particular).
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Fetch every property, optionally narrowed by a native filter
    async fn list_properties(&self, filters: Option<&FilterSpec>) -> Result<Vec<Property>>;

    /// Fetch one property. Fails with `NotFound` for unknown ids.
    async fn get_property(&self, id: &str) -> Result<Property>;

    /// Featured properties, at most [`FEATURED_LIMIT`]
    async fn featured(&self) -> Result<Vec<Property>> {
        Ok(self
            .list_properties(None)
            .await?
            .into_iter()
            .filter(|p| p.featured)
            .take(FEATURED_LIMIT)
            .collect())
    }

    /// Get the name of the backend
    fn backend_name(&self) -> &'static str;
}
