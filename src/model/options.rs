use serde::{Deserialize, Serialize};
use std::fmt;

/// Options recognized by a single crawl
///
/// Deserializes from the `[scrape]` section of the configuration file;
/// every key is optional and falls back to [`ScrapeOptions::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScrapeOptions {
    /// Follow outbound links found on fetched pages
    pub recursive: bool,

    /// Maximum link-follow depth from the seed (seed is depth 0)
    pub max_depth: u32,

    /// Fetch individual product detail pages discovered on listings
    pub include_product_pages: bool,

    /// Hard cap on products in the result
    pub max_products: usize,

    /// Hard cap on the number of page fetches
    pub max_pages_to_visit: usize,

    /// Treat subdomains of the seed host as in scope
    pub include_subdomains: bool,

    /// Derive category/subcategory from product URL paths
    pub detect_categories: bool,

    /// Credentials sent with every request
    #[serde(skip_serializing)]
    pub auth: Option<Auth>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: 2,
            include_product_pages: true,
            max_products: 500,
            max_pages_to_visit: 50,
            include_subdomains: false,
            detect_categories: true,
            auth: None,
        }
    }
}

/// Request credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Auth {
    /// HTTP basic authentication
    Basic {
        username: String,
        #[serde(default)]
        password: Option<String>,
    },

    /// `Authorization: Bearer <token>`
    Bearer { token: String },
}

// Credentials must never reach the logs.
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}
