//! Console statistics for crawl results
//!
//! This module condenses a [`ScrapeResult`] or a set of stored results
//! into figures suitable for printing.

use crate::model::ScrapeResult;
use crate::state::CrawlOutcome;
use crate::storage::StoredResult;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    pub outcome: CrawlOutcome,
    pub products: usize,
    pub total_products_estimate: usize,
    pub has_more_products: bool,
    pub pages_visited: usize,
    pub pages_failed: usize,
    pub links_skipped: usize,
    pub categories: usize,
    pub elapsed_ms: u64,
}

impl CrawlStatistics {
    pub fn from_result(result: &ScrapeResult) -> Self {
        Self {
            outcome: result.outcome,
            products: result.products.len(),
            total_products_estimate: result.total_products_estimate,
            has_more_products: result.has_more_products,
            pages_visited: result.stats.pages_visited,
            pages_failed: result.stats.pages_failed,
            links_skipped: result.stats.links_out_of_scope
                + result.stats.links_disallowed
                + result.stats.urls_dropped_by_limit,
            categories: result
                .store_info
                .as_ref()
                .map(|s| s.categories.len())
                .unwrap_or(0),
            elapsed_ms: result.stats.elapsed_ms,
        }
    }

    /// Percentage of attempted pages that were fetched successfully
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages_visited + self.pages_failed;
        if attempted == 0 {
            0.0
        } else {
            self.pages_visited as f64 / attempted as f64 * 100.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Outcome: {}", stats.outcome);
    println!("  Products found: {}", stats.products);
    println!(
        "  Estimated total: {}{}",
        stats.total_products_estimate,
        if stats.has_more_products {
            " (more available)"
        } else {
            ""
        }
    );
    println!("  Categories: {}", stats.categories);
    println!();

    println!("Pages:");
    println!("  Visited: {}", stats.pages_visited);
    println!("  Failed: {}", stats.pages_failed);
    println!("  Links skipped: {}", stats.links_skipped);
    println!();

    println!(
        "Success Rate: {:.1}% in {:.2}s",
        stats.success_rate(),
        stats.elapsed_ms as f64 / 1000.0
    );
}

/// Prints a listing of stored results
pub fn print_stored_results(results: &[StoredResult]) {
    if results.is_empty() {
        println!("No stored results.");
        return;
    }

    println!("{:<32} {:<18} {:>8}  {}", "KEY", "OUTCOME", "PRODUCTS", "SCRAPED AT");
    for stored in results {
        println!(
            "{:<32} {:<18} {:>8}  {}",
            stored.key, stored.outcome, stored.product_count, stored.scraped_at
        );
    }
}
