//! Storage module for persisting crawl results
//!
//! This module keeps finished [`ScrapeResult`]s under a simple string key,
//! including:
//! - SQLite database initialization and schema versioning
//! - Saving, loading, listing and deleting results
//! - The default key derived from a seed URL

mod schema;
mod sqlite;

pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteResultStore;

use crate::model::ScrapeResult;
use crate::state::CrawlOutcome;
use thiserror::Error;
use url::Url;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported schema version {found} (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Listing entry for a stored result, without the payload
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResult {
    pub key: String,
    pub seed_url: String,
    pub scraped_at: String,
    pub outcome: CrawlOutcome,
    pub product_count: usize,
    pub config_hash: Option<String>,
}

/// Key/value persistence for crawl results
///
/// Saving under an existing key replaces the previous result.
pub trait ResultStore {
    /// Stores `result` under `key`
    ///
    /// # Arguments
    ///
    /// * `key` - Storage key, usually [`default_key`] of the seed
    /// * `result` - The finished crawl result
    /// * `config_hash` - Hash of the configuration that produced it
    fn save(
        &mut self,
        key: &str,
        result: &ScrapeResult,
        config_hash: Option<&str>,
    ) -> StorageResult<()>;

    /// Loads the result stored under `key`
    fn load(&self, key: &str) -> StorageResult<Option<ScrapeResult>>;

    /// Lists stored results, most recent first
    fn list(&self) -> StorageResult<Vec<StoredResult>>;

    /// Deletes the result under `key`, returning whether one existed
    fn delete(&mut self, key: &str) -> StorageResult<bool>;
}

/// Returns the default storage key for a seed: its lowercase host
///
/// Seeds that do not parse are used verbatim.
///
/// # Examples
///
/// ```
/// use storefront_crawler::storage::default_key;
///
/// assert_eq!(default_key("https://Shop.Example.com/sale"), "shop.example.com");
/// assert_eq!(default_key("not a url"), "not a url");
/// ```
pub fn default_key(seed_url: &str) -> String {
    Url::parse(seed_url.trim())
        .ok()
        .and_then(|url| url.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| seed_url.to_string())
}
