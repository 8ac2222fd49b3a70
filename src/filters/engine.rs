use crate::filters::FilterSpec;
use crate::models::{Listing, Property};

/// Decide whether `property` satisfies every active constraint in `spec`
/// and the free-text `search_term`.
///
/// Never fails: a malformed spec (e.g. inverted price bounds) just matches
/// nothing.
pub fn matches(property: &Property, spec: &FilterSpec, search_term: &str) -> bool {
    matches_search(property, search_term)
        && spec.price_min.map_or(true, |min| property.price >= min)
        && spec.price_max.map_or(true, |max| property.price <= max)
        && spec.bedrooms_min.map_or(true, |min| property.bedrooms >= min)
        && spec.bathrooms_min.map_or(true, |min| property.bathrooms >= min)
        && (spec.property_types.is_empty() || spec.property_types.contains(&property.property_type))
        && spec
            .location
            .as_deref()
            .map_or(true, |location| matches_location(property, location))
        && spec
            .square_feet_min
            .map_or(true, |min| property.square_feet >= min)
}

/// Case-insensitive substring search over title, street, city, state,
/// property type and amenities. An empty (or all-whitespace) term matches.
pub fn matches_search(property: &Property, search_term: &str) -> bool {
    let term = search_term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    let address = &property.address;
    [
        property.title.as_str(),
        address.street.as_str(),
        address.city.as_str(),
        address.state.as_str(),
        property.property_type.as_str(),
    ]
    .into_iter()
    .chain(property.amenities.iter().map(String::as_str))
    .any(|field| contains_ignore_case(field, &term))
}

fn matches_location(property: &Property, location: &str) -> bool {
    let needle = location.to_lowercase();
    let address = &property.address;
    [&address.city, &address.state, &address.street]
        .into_iter()
        .any(|field| contains_ignore_case(field, &needle))
}

fn contains_ignore_case(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

/// Keep the listings that match, preserving input order.
pub fn filter<T: Listing + Clone>(listings: &[T], spec: &FilterSpec, search_term: &str) -> Vec<T> {
    listings
        .iter()
        .filter(|l| matches(l.property(), spec, search_term))
        .cloned()
        .collect()
}
