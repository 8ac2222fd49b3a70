use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::models::PropertyType;

/// User-chosen constraints narrowing the property collection.
///
/// `None` (or an empty type set) means "no constraint on this dimension".
/// A bound of `0` is a real constraint, never a stand-in for "unset".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    /// Minimum price, inclusive
    pub price_min: Option<f64>,
    /// Maximum price, inclusive
    pub price_max: Option<f64>,
    /// Minimum number of bedrooms
    pub bedrooms_min: Option<u32>,
    /// Minimum number of bathrooms (may be fractional)
    pub bathrooms_min: Option<f64>,
    /// Accepted property types; empty accepts all
    pub property_types: BTreeSet<PropertyType>,
    /// Case-insensitive text matched against street, city and state
    pub location: Option<String>,
    /// Minimum size in square feet
    pub square_feet_min: Option<u32>,
}

impl FilterSpec {
    /// True when no dimension is constrained
    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Number of constrained dimensions
    pub fn active_count(&self) -> usize {
        [
            self.price_min.is_some(),
            self.price_max.is_some(),
            self.bedrooms_min.is_some(),
            self.bathrooms_min.is_some(),
            !self.property_types.is_empty(),
            self.location.is_some(),
            self.square_feet_min.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    /// Set both price bounds from a quick range. Ordinary bound checks still apply.
    pub fn apply_price_range(&mut self, range: &PriceRange) {
        self.price_min = Some(range.min);
        self.price_max = range.max;
    }

    /// Flip membership of `kind` in the accepted type set.
    pub fn toggle_property_type(&mut self, kind: PropertyType) {
        if !self.property_types.remove(&kind) {
            self.property_types.insert(kind);
        }
    }

    /// Report malformed bounds.
    ///
    /// Purely informational: a spec that fails validation still filters,
    /// it just matches nothing.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("priceMin", self.price_min),
            ("priceMax", self.price_max),
            ("bathroomsMin", self.bathrooms_min),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(Error::Validation(format!(
                        "{} must be a non-negative number, got {}",
                        name, v
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if min > max {
                return Err(Error::Validation(format!(
                    "priceMin ({}) is greater than priceMax ({})",
                    min, max
                )));
            }
        }
        Ok(())
    }
}

/// Preset price band offered as a one-click filter
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceRange {
    pub label: &'static str,
    pub min: f64,
    pub max: Option<f64>,
}

/// Quick price ranges, cheapest first
pub fn price_ranges() -> Vec<PriceRange> {
    vec![
        PriceRange { label: "Under $200K", min: 0.0, max: Some(200_000.0) },
        PriceRange { label: "$200K - $400K", min: 200_000.0, max: Some(400_000.0) },
        PriceRange { label: "$400K - $600K", min: 400_000.0, max: Some(600_000.0) },
        PriceRange { label: "$600K - $800K", min: 600_000.0, max: Some(800_000.0) },
        PriceRange { label: "$800K - $1M", min: 800_000.0, max: Some(1_000_000.0) },
        PriceRange { label: "Over $1M", min: 1_000_000.0, max: None },
    ]
}

/// Look up a quick range by its label, ignoring case.
pub fn price_range(label: &str) -> Option<PriceRange> {
    price_ranges()
        .into_iter()
        .find(|r| r.label.eq_ignore_ascii_case(label.trim()))
}
