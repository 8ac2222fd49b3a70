//! Persistence for user state (favorites, last-used filters).
//!
//! The [`StateStore`] trait is the narrow key/value surface the core needs:
//! every value is a JSON document stored under a string key. Backends are
//! injected into the stores that use them, so tests can substitute
//! [`MemoryStateStore`] for the file-backed [`JsonFileStore`].

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStateStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Key holding the array of favorite entries
pub const FAVORITES_KEY: &str = "homefinder_favorites";
/// Key holding the last-used filter spec
pub const SEARCH_FILTERS_KEY: &str = "homefinder_search_filters";

/// Keyed JSON persistence.
///
/// Failures surface as I/O-class errors and are never retried here.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Prepare the backing medium. Safe to call more than once.
    async fn init(&self) -> Result<()>;

    /// Read the value stored under `key`, or `None` when nothing was written yet.
    async fn read(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the value stored under `key`. Either fully succeeds or leaves
    /// the previous value in place.
    async fn write(&self, key: &str, value: Value) -> Result<()>;
}
