//! Result aggregation across pages
//!
//! The aggregator is owned by the coordinator. It deduplicates products by
//! id (first seen wins), enforces the product cap, merges the category
//! taxonomy and store metadata, and assembles the final [`ScrapeResult`].

use crate::crawler::extractor::PageMeta;
use crate::model::{ContactInfo, CrawlStats, Product, ScrapeResult, StoreInfo};
use crate::state::CrawlOutcome;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Duration;
use url::Url;

/// What the coordinator knows when the crawl stops
#[derive(Debug, Clone, Default)]
pub struct CrawlEnd {
    /// The page cap refused at least one URL
    pub page_limit_reached: bool,

    /// Cancellation or the deadline stopped the crawl
    pub interrupted: bool,

    /// URLs left pending or in flight
    pub unvisited: usize,

    /// Distinct URLs refused by the page cap
    pub urls_dropped_by_limit: usize,

    pub elapsed: Duration,
}

/// Outcome of offering one product to the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Added,
    Duplicate,
    OverLimit,
}

#[derive(Debug)]
pub struct Aggregator {
    seed_url: Url,
    max_products: usize,
    products: Vec<Product>,
    ids: HashSet<String>,
    overflow: HashSet<String>,
    categories: BTreeMap<String, BTreeSet<String>>,
    store_name: Option<String>,
    logo: Option<String>,
    description: Option<String>,
    contact: ContactInfo,
    stats: CrawlStats,
}

impl Aggregator {
    pub fn new(seed_url: Url, max_products: usize) -> Self {
        Self {
            seed_url,
            max_products,
            products: Vec::new(),
            ids: HashSet::new(),
            overflow: HashSet::new(),
            categories: BTreeMap::new(),
            store_name: None,
            logo: None,
            description: None,
            contact: ContactInfo::default(),
            stats: CrawlStats::default(),
        }
    }

    /// Offers a product; later duplicates of an id are discarded
    pub fn add_product(&mut self, product: Product) -> Admission {
        if self.ids.contains(&product.id) || self.overflow.contains(&product.id) {
            self.stats.duplicate_products += 1;
            return Admission::Duplicate;
        }

        if self.products.len() >= self.max_products {
            tracing::debug!("Product cap reached, counting {} as overflow", product.id);
            self.overflow.insert(product.id);
            return Admission::OverLimit;
        }

        if let Some(category) = &product.category {
            let subcategories = self.categories.entry(category.clone()).or_default();
            if let Some(subcategory) = &product.subcategory {
                subcategories.insert(subcategory.clone());
            }
        }

        self.ids.insert(product.id.clone());
        self.products.push(product);
        Admission::Added
    }

    pub fn add_products(&mut self, products: impl IntoIterator<Item = Product>) {
        for product in products {
            self.add_product(product);
        }
    }

    /// Merges page metadata; the first page to provide a field wins
    pub fn add_page_meta(&mut self, meta: &PageMeta) {
        if self.store_name.is_none() {
            self.store_name = meta.site_name.clone();
        }
        if self.logo.is_none() {
            self.logo = meta.logo.clone();
        }
        if self.description.is_none() {
            self.description = meta.description.clone();
        }
        self.contact.fill_from(&meta.contact);
    }

    pub fn record_page_visited(&mut self) {
        self.stats.pages_visited += 1;
    }

    pub fn record_page_failed(&mut self) {
        self.stats.pages_failed += 1;
    }

    pub fn record_out_of_scope(&mut self, count: usize) {
        self.stats.links_out_of_scope += count;
    }

    pub fn record_disallowed(&mut self, count: usize) {
        self.stats.links_disallowed += count;
    }

    /// Returns true once a unique product was refused by the cap
    pub fn product_limit_reached(&self) -> bool {
        !self.overflow.is_empty()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Builds the final result
    pub fn finish(self, end: CrawlEnd) -> ScrapeResult {
        let has_more = end.page_limit_reached || end.interrupted || self.product_limit_reached();
        let count = self.products.len();

        let total_products_estimate = if has_more {
            estimate_total(
                count,
                self.overflow.len(),
                self.stats.pages_visited,
                end.unvisited + end.urls_dropped_by_limit,
            )
        } else {
            count
        };

        let mut stats = self.stats;
        stats.urls_dropped_by_limit = end.urls_dropped_by_limit;
        stats.elapsed_ms = elapsed_ms(end.elapsed);

        let root = root_url(&self.seed_url);
        let store_info = StoreInfo {
            name: self
                .store_name
                .or_else(|| self.seed_url.host_str().map(str::to_string))
                .unwrap_or_default(),
            url: root,
            categories: self.categories.keys().cloned().collect(),
            subcategories: self
                .categories
                .into_iter()
                .map(|(category, subs)| (category, subs.into_iter().collect()))
                .collect(),
            logo: self.logo,
            description: self.description,
        };

        ScrapeResult {
            success: true,
            outcome: if has_more {
                CrawlOutcome::CompletedPartial
            } else {
                CrawlOutcome::Completed
            },
            error: None,
            seed_url: self.seed_url.to_string(),
            products: self.products,
            store_info: Some(store_info),
            contact_info: (!self.contact.is_empty()).then_some(self.contact),
            scraped_at: Utc::now(),
            total_products_estimate,
            has_more_products: has_more,
            stats,
        }
    }
}

/// Milliseconds in `elapsed`, saturating at `u64::MAX`
pub(crate) fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Extrapolates the catalog size of a partial crawl
///
/// `max(count + overflow, count + ceil(count / pages_visited * unvisited))`
pub fn estimate_total(count: usize, overflow: usize, pages_visited: usize, unvisited: usize) -> usize {
    let seen = count + overflow;
    if pages_visited == 0 {
        return seen;
    }

    let per_page = count as f64 / pages_visited as f64;
    let extrapolated = count + (per_page * unvisited as f64).ceil() as usize;
    seen.max(extrapolated)
}

fn root_url(seed: &Url) -> String {
    let mut root = seed.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root.to_string()
}
