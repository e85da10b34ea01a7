//! Output module for crawl reports and exports
//!
//! This module handles:
//! - Generating markdown summaries of crawl results
//! - Exporting products as CSV
//! - Printing crawl statistics to the console

mod csv;
mod markdown;
pub mod stats;

pub use self::csv::{format_products_csv, write_products_csv, CSV_HEADER};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, print_stored_results, CrawlStatistics};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
