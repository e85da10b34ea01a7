use crate::model::{ContactInfo, Product, StoreInfo};
use crate::state::CrawlOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters collected while a crawl runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStats {
    /// Pages fetched successfully
    pub pages_visited: usize,

    /// Pages whose fetch failed and were skipped
    pub pages_failed: usize,

    /// Discovered links dropped by the domain scope
    pub links_out_of_scope: usize,

    /// Discovered links disallowed by robots.txt
    pub links_disallowed: usize,

    /// URLs rejected because the page cap was reached
    pub urls_dropped_by_limit: usize,

    /// Product candidates discarded as duplicates of an earlier id
    pub duplicate_products: usize,

    /// Wall-clock duration of the crawl
    pub elapsed_ms: u64,
}

/// Final result of a crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub success: bool,

    pub outcome: CrawlOutcome,

    /// Human-readable failure message, set only when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub seed_url: String,

    pub products: Vec<Product>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_info: Option<StoreInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,

    pub scraped_at: DateTime<Utc>,

    pub total_products_estimate: usize,

    /// More products exist beyond the ones returned
    pub has_more_products: bool,

    pub stats: CrawlStats,
}

impl ScrapeResult {
    /// Builds a failed result carrying a single message
    pub fn failed(seed_url: impl Into<String>, message: impl Into<String>, stats: CrawlStats) -> Self {
        Self {
            success: false,
            outcome: CrawlOutcome::Failed,
            error: Some(message.into()),
            seed_url: seed_url.into(),
            products: Vec::new(),
            store_info: None,
            contact_info: None,
            scraped_at: Utc::now(),
            total_products_estimate: 0,
            has_more_products: false,
            stats,
        }
    }

    /// Returns true if the crawl stopped before exhausting the store
    pub fn is_partial(&self) -> bool {
        matches!(self.outcome, CrawlOutcome::CompletedPartial)
    }
}
