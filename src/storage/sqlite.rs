//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ResultStore
//! trait. Each result is stored as its JSON serialization alongside a few
//! columns used for listing.

use crate::model::ScrapeResult;
use crate::state::CrawlOutcome;
use crate::storage::schema::initialize_schema;
use crate::storage::{ResultStore, StorageResult, StoredResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite result store
pub struct SqliteResultStore {
    conn: Connection,
}

impl SqliteResultStore {
    /// Opens or creates the result store at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory store
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Returns the number of stored results
    pub fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM scrape_results", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl ResultStore for SqliteResultStore {
    fn save(
        &mut self,
        key: &str,
        result: &ScrapeResult,
        config_hash: Option<&str>,
    ) -> StorageResult<()> {
        let payload = serde_json::to_string(result)?;
        self.conn.execute(
            "INSERT INTO scrape_results
             (key, seed_url, scraped_at, outcome, product_count, config_hash, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(key) DO UPDATE SET
                seed_url = excluded.seed_url,
                scraped_at = excluded.scraped_at,
                outcome = excluded.outcome,
                product_count = excluded.product_count,
                config_hash = excluded.config_hash,
                payload = excluded.payload",
            params![
                key,
                result.seed_url,
                result.scraped_at.to_rfc3339(),
                result.outcome.as_str(),
                result.products.len() as i64,
                config_hash,
                payload,
            ],
        )?;

        tracing::debug!("Stored result for {} under '{}'", result.seed_url, key);
        Ok(())
    }

    fn load(&self, key: &str) -> StorageResult<Option<ScrapeResult>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM scrape_results WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> StorageResult<Vec<StoredResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, seed_url, scraped_at, outcome, product_count, config_hash
             FROM scrape_results ORDER BY scraped_at DESC, key ASC",
        )?;

        let results = stmt
            .query_map([], |row| {
                Ok(StoredResult {
                    key: row.get(0)?,
                    seed_url: row.get(1)?,
                    scraped_at: row.get(2)?,
                    outcome: CrawlOutcome::from_db_string(&row.get::<_, String>(3)?)
                        .unwrap_or(CrawlOutcome::Failed),
                    product_count: row.get::<_, i64>(4)? as usize,
                    config_hash: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(results)
    }

    fn delete(&mut self, key: &str) -> StorageResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM scrape_results WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CrawlStats, Product};
    use chrono::{Duration, Utc};
    use tempfile::NamedTempFile;

    fn sample_result(seed: &str) -> ScrapeResult {
        let mut result = ScrapeResult::failed(seed, "placeholder", CrawlStats::default());
        result.success = true;
        result.outcome = CrawlOutcome::Completed;
        result.error = None;
        result.products.push(Product {
            id: "abc".to_string(),
            name: "Trail Runner".to_string(),
            price: 80.0,
            original_price: None,
            discount: None,
            currency: Some("USD".to_string()),
            image_url: None,
            detail_url: format!("{}shoes/trail-runner", seed),
            in_stock: Some(true),
            rating: None,
            brand: None,
            sku: None,
            description: None,
            specifications: Default::default(),
            category: Some("shoes".to_string()),
            subcategory: Some("trail-runner".to_string()),
        });
        result.total_products_estimate = 1;
        result
    }

    #[test]
    fn test_save_and_load() {
        let mut store = SqliteResultStore::new_in_memory().unwrap();
        let result = sample_result("https://store.test/");

        store.save("store.test", &result, Some("hash")).unwrap();

        let loaded = store.load("store.test").unwrap().unwrap();
        assert_eq!(loaded, result);
    }

    #[test]
    fn test_load_missing_key() {
        let store = SqliteResultStore::new_in_memory().unwrap();
        assert!(store.load("nothing.test").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_existing_key() {
        let mut store = SqliteResultStore::new_in_memory().unwrap();
        let first = sample_result("https://store.test/");
        let mut second = sample_result("https://store.test/");
        second.products.clear();

        store.save("store.test", &first, None).unwrap();
        store.save("store.test", &second, None).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert!(store.load("store.test").unwrap().unwrap().products.is_empty());
    }

    #[test]
    fn test_list_most_recent_first() {
        let mut store = SqliteResultStore::new_in_memory().unwrap();
        let mut older = sample_result("https://a.test/");
        older.scraped_at = Utc::now() - Duration::hours(1);
        let newer = sample_result("https://b.test/");

        store.save("a.test", &older, Some("h1")).unwrap();
        store.save("b.test", &newer, None).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, "b.test");
        assert_eq!(listed[1].key, "a.test");
        assert_eq!(listed[1].config_hash.as_deref(), Some("h1"));
        assert_eq!(listed[0].outcome, CrawlOutcome::Completed);
        assert_eq!(listed[0].product_count, 1);
    }

    #[test]
    fn test_delete() {
        let mut store = SqliteResultStore::new_in_memory().unwrap();
        store
            .save("store.test", &sample_result("https://store.test/"), None)
            .unwrap();

        assert!(store.delete("store.test").unwrap());
        assert!(!store.delete("store.test").unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let file = NamedTempFile::new().unwrap();
        let result = sample_result("https://store.test/");

        {
            let mut store = SqliteResultStore::new(file.path()).unwrap();
            store.save("store.test", &result, None).unwrap();
        }

        let store = SqliteResultStore::new(file.path()).unwrap();
        assert_eq!(store.load("store.test").unwrap(), Some(result));
    }
}
