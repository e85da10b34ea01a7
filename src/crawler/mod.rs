//! Crawler module for page fetching and product extraction
//!
//! This module contains the core crawling logic, including:
//! - The frontier: bounded, depth-ordered, de-duplicating URL queue
//! - Scope- and auth-aware HTTP fetching
//! - Product and store metadata extraction from HTML
//! - Path-based category classification
//! - Result aggregation and overall crawl coordination

mod aggregator;
mod classifier;
mod coordinator;
mod extractor;
mod fetcher;
mod frontier;

pub use aggregator::{estimate_total, Admission, Aggregator, CrawlEnd};
pub use classifier::classify;
pub use coordinator::{run_crawl, Crawler, CrawlerSettings};
pub use extractor::{detect_currency, extract, parse_price, ExtractedPage, PageMeta};
pub use fetcher::{
    build_http_client, FetchError, FetchedPage, Fetcher, HttpTransport, Transport,
};
pub use frontier::{Frontier, QueuedUrl, Rejection};
