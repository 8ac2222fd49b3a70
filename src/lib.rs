//! # Home Finder
//!
//! Client-side core of a property browsing app: canonical listing records,
//! the filter and sort engines, the persisted favorites set, and
//! side-by-side comparison.
//!
//! Data flow: a [`PropertyRepository`](repository::PropertyRepository)
//! yields candidates, [`filters`] narrows them, [`sort`] orders them.
//! [`favorites::FavoritesStore`] is shared by every view and queried per
//! property. [`compare`] works on a user-picked subset of 2 to 3.

pub mod compare;
pub mod config;
pub mod error;
pub mod favorites;
pub mod filters;
pub mod finder;
pub mod models;
pub mod repository;
pub mod sort;
pub mod storage;

pub use error::{Error, Result};
pub use finder::{filter_and_sort, FavoriteStatus, HomeFinder};
