pub mod engine;
pub mod store;
pub mod types;

pub use engine::{filter, matches, matches_search};
pub use store::FilterSpecStore;
pub use types::{price_range, price_ranges, FilterSpec, PriceRange};
