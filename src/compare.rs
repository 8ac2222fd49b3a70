//! Side-by-side comparison of a small selection of properties.

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Property;

/// Most properties that can be compared at once
pub const MAX_SELECTION: usize = 3;
/// Fewest properties that produce a comparison table
pub const MIN_COMPARISON: usize = 2;

/// Rows of the comparison table, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Attribute {
    Price,
    PropertyType,
    Bedrooms,
    Bathrooms,
    SquareFeet,
    YearBuilt,
    Location,
    Status,
}

/// Direction in which an attribute's value is "better"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preference {
    Lower,
    Higher,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::Price,
        Attribute::PropertyType,
        Attribute::Bedrooms,
        Attribute::Bathrooms,
        Attribute::SquareFeet,
        Attribute::YearBuilt,
        Attribute::Location,
        Attribute::Status,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Attribute::Price => "Price",
            Attribute::PropertyType => "Property Type",
            Attribute::Bedrooms => "Bedrooms",
            Attribute::Bathrooms => "Bathrooms",
            Attribute::SquareFeet => "Square Feet",
            Attribute::YearBuilt => "Year Built",
            Attribute::Location => "Location",
            Attribute::Status => "Status",
        }
    }

    fn preference(&self) -> Option<Preference> {
        match self {
            Attribute::Price => Some(Preference::Lower),
            Attribute::Bedrooms
            | Attribute::Bathrooms
            | Attribute::SquareFeet
            | Attribute::YearBuilt => Some(Preference::Higher),
            Attribute::PropertyType | Attribute::Location | Attribute::Status => None,
        }
    }

    /// Value of this attribute for `property`
    pub fn value(&self, property: &Property) -> AttributeValue {
        match self {
            Attribute::Price => AttributeValue::Number(property.price),
            Attribute::Bedrooms => AttributeValue::Number(f64::from(property.bedrooms)),
            Attribute::Bathrooms => AttributeValue::Number(property.bathrooms),
            Attribute::SquareFeet => AttributeValue::Number(f64::from(property.square_feet)),
            Attribute::YearBuilt => AttributeValue::Number(f64::from(property.year_built)),
            Attribute::PropertyType => AttributeValue::Text(property.property_type.to_string()),
            Attribute::Location => AttributeValue::Text(property.location_label()),
            Attribute::Status => AttributeValue::Text(property.status.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(_) => None,
        }
    }
}

/// Best value of `attribute` across `properties`.
///
/// `None` for display-only attributes and for an empty slice.
pub fn best_value(attribute: Attribute, properties: &[Property]) -> Option<f64> {
    let preference = attribute.preference()?;
    let values = properties
        .iter()
        .filter_map(|p| attribute.value(p).as_number());
    match preference {
        Preference::Lower => values.min_by(f64::total_cmp),
        Preference::Higher => values.max_by(f64::total_cmp),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonCell {
    pub property_id: String,
    pub value: AttributeValue,
    pub is_best: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub attribute: Attribute,
    pub label: &'static str,
    pub cells: Vec<ComparisonCell>,
}

/// Build the comparison table for 2 to 3 properties.
///
/// Every cell holding the best value is flagged, so ties share the highlight.
pub fn compare(properties: &[Property]) -> Result<Vec<ComparisonRow>> {
    if !(MIN_COMPARISON..=MAX_SELECTION).contains(&properties.len()) {
        return Err(Error::Validation(format!(
            "comparison needs {} to {} properties, got {}",
            MIN_COMPARISON,
            MAX_SELECTION,
            properties.len()
        )));
    }

    let rows = Attribute::ALL
        .into_iter()
        .map(|attribute| {
            let best = best_value(attribute, properties);
            let cells = properties
                .iter()
                .map(|p| {
                    let value = attribute.value(p);
                    let is_best = matches!((best, value.as_number()), (Some(b), Some(v)) if b == v);
                    ComparisonCell {
                        property_id: p.id.clone(),
                        value,
                        is_best,
                    }
                })
                .collect();
            ComparisonRow {
                attribute,
                label: attribute.label(),
                cells,
            }
        })
        .collect();
    Ok(rows)
}

/// Change applied by [`ComparisonSelection::toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Selected,
    Deselected,
}

/// Properties picked for comparison; never more than [`MAX_SELECTION`].
#[derive(Debug, Clone, Default)]
pub struct ComparisonSelection {
    selected: Vec<Property>,
}

impl ComparisonSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn properties(&self) -> &[Property] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.selected.len() >= MAX_SELECTION
    }

    pub fn contains(&self, property_id: &str) -> bool {
        self.selected.iter().any(|p| p.id == property_id)
    }

    /// Add `property`. Fails with [`Error::SelectionFull`] when the
    /// selection is already at capacity, leaving it unchanged.
    pub fn select(&mut self, property: Property) -> Result<()> {
        if self.contains(&property.id) {
            return Ok(());
        }
        if self.is_full() {
            return Err(Error::SelectionFull { max: MAX_SELECTION });
        }
        debug!("Selected {} for comparison", property.id);
        self.selected.push(property);
        Ok(())
    }

    pub fn deselect(&mut self, property_id: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|p| p.id != property_id);
        before != self.selected.len()
    }

    /// Deselect when already selected, otherwise select.
    pub fn toggle(&mut self, property: Property) -> Result<SelectionChange> {
        if self.deselect(&property.id) {
            return Ok(SelectionChange::Deselected);
        }
        self.select(property)?;
        Ok(SelectionChange::Selected)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Comparison table, or `None` while fewer than two are selected
    pub fn table(&self) -> Option<Vec<ComparisonRow>> {
        compare(&self.selected).ok()
    }
}
