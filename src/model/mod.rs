//! Data model for crawl inputs and outputs
//!
//! Everything here is created fresh per crawl and is immutable once a
//! [`ScrapeResult`] has been returned. All types serialize with camelCase
//! field names so stored results round-trip through JSON unchanged.

mod options;
mod product;
mod result;
mod store;

pub use options::{Auth, ScrapeOptions};
pub use product::{product_id, Product, ProductBuilder};
pub use result::{CrawlStats, ScrapeResult};
pub use store::{ContactInfo, StoreInfo};
