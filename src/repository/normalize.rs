//! Translation of backend record shapes into the canonical [`Property`].
//!
//! Each backend variant gets one [`Normalizer`], chosen when the repository
//! is built. Comma-joined list columns are split and trimmed; flat address
//! and coordinate columns are assembled into their nested structs; numeric
//! ids become their decimal string form.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::models::{Address, Coordinates, ListingStatus, Property, PropertyType};

pub trait Normalizer: Send + Sync {
    fn normalize(&self, record: Value) -> Result<Property>;

    fn name(&self) -> &'static str;
}

/// Record shape a backend emits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordShape {
    /// Already nested, camelCase (`address.zipCode`, `squareFeet`)
    #[default]
    Structured,
    /// Flat underscored columns (`zip_code`, `square_feet`, `latitude`)
    Flat,
}

impl RecordShape {
    pub fn normalizer(self) -> Box<dyn Normalizer> {
        match self {
            RecordShape::Structured => Box::new(StructuredNormalizer),
            RecordShape::Flat => Box::new(FlatRecordNormalizer),
        }
    }
}

/// Accepts the canonical shape, tolerating joined-string lists and numeric ids
pub struct StructuredNormalizer;

impl Normalizer for StructuredNormalizer {
    fn normalize(&self, record: Value) -> Result<Property> {
        let Value::Object(mut map) = record else {
            return Err(Error::invalid_record(None, "record is not a JSON object"));
        };
        let id = id_of(&map);
        if let Some(id) = &id {
            map.insert("id".to_string(), Value::String(id.clone()));
        }
        for key in ["images", "amenities"] {
            if let Some(Value::String(joined)) = map.get(key) {
                let list = split_list(joined).into_iter().map(Value::String).collect();
                map.insert(key.to_string(), Value::Array(list));
            }
        }
        serde_json::from_value(Value::Object(map))
            .map_err(|e| Error::invalid_record(id.as_deref(), e.to_string()))
    }

    fn name(&self) -> &'static str {
        "structured"
    }
}

/// Assembles records from flat, underscored columns
pub struct FlatRecordNormalizer;

impl Normalizer for FlatRecordNormalizer {
    fn normalize(&self, record: Value) -> Result<Property> {
        let Value::Object(map) = record else {
            return Err(Error::invalid_record(None, "record is not a JSON object"));
        };
        let row = Row::new(&map);
        let id = row
            .id
            .clone()
            .ok_or_else(|| Error::invalid_record(None, "missing id"))?;

        let property_type = row
            .text(&["property_type", "propertyType", "type"])
            .ok_or_else(|| row.invalid("missing property_type"))?
            .parse::<PropertyType>()
            .map_err(|e| row.invalid(e.to_string()))?;

        Ok(Property {
            title: row.text(&["title", "Name", "name"]).unwrap_or_default(),
            price: row
                .number(&["price"])?
                .ok_or_else(|| row.invalid("missing price"))?,
            address: Address {
                street: row.text(&["street", "address_street"]).unwrap_or_default(),
                city: row.text(&["city", "address_city"]).unwrap_or_default(),
                state: row.text(&["state", "address_state"]).unwrap_or_default(),
                zip_code: row
                    .text(&["zip_code", "zipcode", "address_zip_code"])
                    .unwrap_or_default(),
                country: row.text(&["country", "address_country"]).unwrap_or_default(),
            },
            bedrooms: row.count(&["bedrooms"])?.unwrap_or(0),
            bathrooms: row.number(&["bathrooms"])?.unwrap_or(0.0),
            square_feet: row.count(&["square_feet", "squarefeet"])?.unwrap_or(0),
            property_type,
            images: row.list(&["images"]),
            description: row.text(&["description"]).unwrap_or_default(),
            amenities: row.list(&["amenities"]),
            coordinates: Coordinates {
                lat: row.number(&["latitude", "lat", "coordinates_lat"])?.unwrap_or(0.0),
                lng: row.number(&["longitude", "lng", "coordinates_lng"])?.unwrap_or(0.0),
            },
            year_built: row
                .number(&["year_built", "yearbuilt"])?
                .map(|y| y as i32)
                .unwrap_or(0),
            status: row
                .text(&["status"])
                .map(|s| ListingStatus::parse(&s))
                .unwrap_or_default(),
            featured: row.flag(&["featured"]),
            id,
        })
    }

    fn name(&self) -> &'static str {
        "flat"
    }
}

/// Split a comma-joined column into trimmed, non-empty items
pub fn split_list(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn id_of(map: &Map<String, Value>) -> Option<String> {
    ["id", "Id", "ID"]
        .iter()
        .find_map(|k| match map.get(*k)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Lenient column accessor over one flat record
struct Row<'a> {
    map: &'a Map<String, Value>,
    id: Option<String>,
}

impl<'a> Row<'a> {
    fn new(map: &'a Map<String, Value>) -> Self {
        Self {
            map,
            id: id_of(map),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::invalid_record(self.id.as_deref(), reason)
    }

    fn get(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .find_map(|k| self.map.get(*k))
            .filter(|v| !v.is_null())
    }

    fn text(&self, keys: &[&str]) -> Option<String> {
        match self.get(keys)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn number(&self, keys: &[&str]) -> Result<Option<f64>> {
        let value = match self.get(keys) {
            None => return Ok(None),
            Some(v) => v,
        };
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if s.trim().is_empty() => return Ok(None),
            Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if n.is_finite() => Ok(Some(n)),
            _ => Err(self.invalid(format!("'{}' is not a number: {}", keys[0], value))),
        }
    }

    fn count(&self, keys: &[&str]) -> Result<Option<u32>> {
        match self.number(keys)? {
            Some(n) if n < 0.0 => Err(self.invalid(format!("'{}' is negative", keys[0]))),
            Some(n) => Ok(Some(n.round() as u32)),
            None => Ok(None),
        }
    }

    fn list(&self, keys: &[&str]) -> Vec<String> {
        match self.get(keys) {
            Some(Value::String(joined)) => split_list(joined),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn flag(&self, keys: &[&str]) -> bool {
        match self.get(keys) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64() == Some(1.0),
            Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
            _ => false,
        }
    }
}
