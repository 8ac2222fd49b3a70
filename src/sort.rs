//! Orderings over listing collections.
//!
//! Every sort is stable (equal keys keep their input order) and returns a
//! new vector, leaving the input untouched.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::Listing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortKey {
    PriceAsc,
    PriceDesc,
    BedsDesc,
    SqftDesc,
    /// Most recently built first
    Newest,
    /// Most recently favorited first
    SavedNewest,
    SavedOldest,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::BedsDesc,
        SortKey::SqftDesc,
        SortKey::Newest,
        SortKey::SavedNewest,
        SortKey::SavedOldest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
            SortKey::BedsDesc => "beds-desc",
            SortKey::SqftDesc => "sqft-desc",
            SortKey::Newest => "newest",
            SortKey::SavedNewest => "saved-newest",
            SortKey::SavedOldest => "saved-oldest",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::PriceAsc => "Price: Low to High",
            SortKey::PriceDesc => "Price: High to Low",
            SortKey::BedsDesc => "Most Bedrooms",
            SortKey::SqftDesc => "Largest Size",
            SortKey::Newest => "Year Built: Newest",
            SortKey::SavedNewest => "Recently Saved",
            SortKey::SavedOldest => "Oldest Saved",
        }
    }

    /// Keys that only make sense for favorites, where each row has a save time
    pub fn needs_saved_at(&self) -> bool {
        matches!(self, SortKey::SavedNewest | SortKey::SavedOldest)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price-asc" | "price-low" => Ok(SortKey::PriceAsc),
            "price-desc" | "price-high" => Ok(SortKey::PriceDesc),
            "beds-desc" | "beds-high" => Ok(SortKey::BedsDesc),
            "sqft-desc" | "sqft-high" => Ok(SortKey::SqftDesc),
            "newest" => Ok(SortKey::Newest),
            "saved-newest" => Ok(SortKey::SavedNewest),
            "saved-oldest" => Ok(SortKey::SavedOldest),
            _ => Err(Error::InvalidSortKey(s.to_string())),
        }
    }
}

impl TryFrom<String> for SortKey {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.as_str().to_string()
    }
}

/// Return `listings` ordered by `key`.
pub fn sort<T: Listing + Clone>(listings: &[T], key: SortKey) -> Vec<T> {
    let mut sorted = listings.to_vec();
    sorted.sort_by(|a, b| compare(a, b, key));
    sorted
}

/// Parse `key` and sort. Unknown keys are an error, never a silent no-op.
pub fn sort_by_name<T: Listing + Clone>(listings: &[T], key: &str) -> Result<Vec<T>, Error> {
    Ok(sort(listings, key.parse()?))
}

fn compare<T: Listing>(a: &T, b: &T, key: SortKey) -> Ordering {
    let (pa, pb) = (a.property(), b.property());
    match key {
        SortKey::PriceAsc => pa.price.total_cmp(&pb.price),
        SortKey::PriceDesc => pb.price.total_cmp(&pa.price),
        SortKey::BedsDesc => pb.bedrooms.cmp(&pa.bedrooms),
        SortKey::SqftDesc => pb.square_feet.cmp(&pa.square_feet),
        SortKey::Newest => pb.year_built.cmp(&pa.year_built),
        SortKey::SavedNewest | SortKey::SavedOldest => match (a.saved_at(), b.saved_at()) {
            (Some(x), Some(y)) if key == SortKey::SavedNewest => y.cmp(&x),
            (Some(x), Some(y)) => x.cmp(&y),
            // Missing save times go last in either direction
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}
