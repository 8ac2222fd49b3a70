use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Kind of property a listing describes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyType {
    House,
    Apartment,
    Condo,
    Townhouse,
    #[serde(rename = "Single Family")]
    SingleFamily,
    #[serde(rename = "Multi Family")]
    MultiFamily,
    Land,
    Commercial,
}

impl PropertyType {
    /// All property types, in the order the filter panel lists them
    pub const ALL: [PropertyType; 8] = [
        PropertyType::House,
        PropertyType::Apartment,
        PropertyType::Condo,
        PropertyType::Townhouse,
        PropertyType::SingleFamily,
        PropertyType::MultiFamily,
        PropertyType::Land,
        PropertyType::Commercial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::House => "House",
            PropertyType::Apartment => "Apartment",
            PropertyType::Condo => "Condo",
            PropertyType::Townhouse => "Townhouse",
            PropertyType::SingleFamily => "Single Family",
            PropertyType::MultiFamily => "Multi Family",
            PropertyType::Land => "Land",
            PropertyType::Commercial => "Commercial",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = Error;

    /// Case-insensitive; accepts "SingleFamily", "single family" and "single-family" alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        PropertyType::ALL
            .into_iter()
            .find(|t| t.as_str().replace(' ', "").to_lowercase() == wanted)
            .ok_or_else(|| Error::Validation(format!("unknown property type: '{}'", s)))
    }
}

/// Listing status. Display-only, never filtered on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ListingStatus {
    #[default]
    #[serde(rename = "For Sale")]
    ForSale,
    #[serde(rename = "For Rent")]
    ForRent,
    Pending,
    Sold,
    #[serde(untagged)]
    Other(String),
}

impl ListingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ListingStatus::ForSale => "For Sale",
            ListingStatus::ForRent => "For Rent",
            ListingStatus::Pending => "Pending",
            ListingStatus::Sold => "Sold",
            ListingStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "For Sale" => ListingStatus::ForSale,
            "For Rent" => ListingStatus::ForRent,
            "Pending" => ListingStatus::Pending,
            "Sold" => ListingStatus::Sold,
            other => ListingStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Postal address of a property
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// Geographic position of a property
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Canonical property record, whatever backend it came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub address: Address,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub square_feet: u32,
    pub property_type: PropertyType,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub coordinates: Coordinates,
    pub year_built: i32,
    #[serde(default)]
    pub status: ListingStatus,
    #[serde(default)]
    pub featured: bool,
}

impl Property {
    /// First image, if the listing has any
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// "City, State" as shown on cards and in the comparison table
    pub fn location_label(&self) -> String {
        format!("{}, {}", self.address.city, self.address.state)
    }
}

/// A saved association between the user and a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub property_id: String,
    pub saved_at: DateTime<Utc>,
}

/// A property joined with the time it was favorited
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedProperty {
    #[serde(flatten)]
    pub property: Property,
    pub saved_at: Option<DateTime<Utc>>,
}

/// Anything that can be filtered and sorted as a listing.
///
/// Plain properties carry no save time; favorites-context rows do.
pub trait Listing {
    fn property(&self) -> &Property;

    fn saved_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl Listing for Property {
    fn property(&self) -> &Property {
        self
    }
}

impl Listing for SavedProperty {
    fn property(&self) -> &Property {
        &self.property
    }

    fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }
}
