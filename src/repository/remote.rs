use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::filters::FilterSpec;
use crate::models::Property;
use crate::repository::normalize::Normalizer;
use crate::repository::traits::PropertyRepository;

/// Property backend served by a remote record API.
///
/// Records are fetched from `{base_url}/tables/{table}/records` and run
/// through the normalizer chosen at construction.
pub struct RemoteRepository {
    client: Client,
    base_url: Url,
    table: String,
    normalizer: Box<dyn Normalizer>,
}

impl RemoteRepository {
    pub fn new(
        base_url: &str,
        table: &str,
        timeout: Duration,
        normalizer: Box<dyn Normalizer>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Validation(format!("invalid base_url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Validation(format!(
                "base_url '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("home-finder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            table: table.to_string(),
            normalizer,
        })
    }

    /// `base_url` with `segments` appended, each percent-encoded as a
    /// single path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base always accepts path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn records_url(&self) -> Url {
        self.endpoint(&["tables", &self.table, "records"])
    }

    /// URL of one record. `"."` and `".."` are not addressable ids: they
    /// would collapse onto the collection URL.
    fn record_url(&self, id: &str) -> Result<Url> {
        if matches!(id.trim(), "" | "." | "..") {
            return Err(Error::not_found("property", id));
        }
        Ok(self.endpoint(&["tables", &self.table, "records", id]))
    }

    fn normalize_all(&self, records: Vec<Value>) -> Vec<Property> {
        records
            .into_iter()
            .filter_map(|record| match self.normalizer.normalize(record) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Skipping remote record: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Query parameters for the bounds the record API can enforce.
///
/// Text constraints are left to the client-side filter.
pub fn native_query(spec: &FilterSpec) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(v) = spec.price_min {
        query.push(("price_min", v.to_string()));
    }
    if let Some(v) = spec.price_max {
        query.push(("price_max", v.to_string()));
    }
    if let Some(v) = spec.bedrooms_min {
        query.push(("bedrooms_min", v.to_string()));
    }
    if let Some(v) = spec.bathrooms_min {
        query.push(("bathrooms_min", v.to_string()));
    }
    if let Some(v) = spec.square_feet_min {
        query.push(("square_feet_min", v.to_string()));
    }
    if !spec.property_types.is_empty() {
        let kinds: Vec<&str> = spec.property_types.iter().map(|t| t.as_str()).collect();
        query.push(("property_type", kinds.join(",")));
    }
    query
}

/// Pull the record list out of a response body: a bare array, or an
/// envelope with `data` / `records`.
pub fn unwrap_records(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("data").or_else(|| map.remove("records")) {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(Error::invalid_record(None, "response has no record list")),
        },
        _ => Err(Error::invalid_record(None, "unexpected response body")),
    }
}

/// Pull a single record out of a response body, with or without a `data`
/// envelope. An envelope holding `null` yields `Value::Null`.
pub fn unwrap_record(body: Value) -> Value {
    match body {
        Value::Object(mut map)
            if matches!(map.get("data"), Some(Value::Object(_) | Value::Null)) =>
        {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl PropertyRepository for RemoteRepository {
    async fn list_properties(&self, native: Option<&FilterSpec>) -> Result<Vec<Property>> {
        let url = self.records_url();
        let query = native.map(native_query).unwrap_or_default();
        debug!("Fetching {} with {} native filters", url, query.len());

        let response = self.client.get(url).query(&query).send().await?;
        if !response.status().is_success() {
            warn!("Record API returned status: {}", response.status());
        }
        let body: Value = response.error_for_status()?.json().await?;
        let properties = self.normalize_all(unwrap_records(body)?);

        info!("Fetched {} properties from {}", properties.len(), self.table);
        Ok(properties)
    }

    async fn get_property(&self, id: &str) -> Result<Property> {
        let url = self.record_url(id)?;
        debug!("Fetching URL: {}", url);

        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found("property", id));
        }
        let body: Value = response.error_for_status()?.json().await?;
        match unwrap_record(body) {
            Value::Null => Err(Error::not_found("property", id)),
            record => self.normalizer.normalize(record),
        }
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}
