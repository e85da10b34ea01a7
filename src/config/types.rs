use crate::model::ScrapeOptions;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub scrape: ScrapeOptions,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler runtime configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of concurrent page workers
    pub workers: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Minimum time between request starts to the same host (milliseconds)
    #[serde(rename = "minimum-time-between-requests")]
    pub minimum_time_between_requests: u64,

    /// Wall-clock cap on a whole crawl (seconds)
    #[serde(rename = "deadline-secs")]
    pub deadline_secs: Option<u64>,

    /// Fetch robots.txt and skip disallowed URLs
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            request_timeout_secs: 30,
            minimum_time_between_requests: 250,
            deadline_secs: None,
            respect_robots: true,
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn request_gap(&self) -> Duration {
        Duration::from_millis(self.minimum_time_between_requests)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: String::new(),
            contact_email: String::new(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    ///
    /// The parenthesized contact part is left out when no contact is set.
    pub fn header_value(&self) -> String {
        let product = format!("{}/{}", self.crawler_name, self.crawler_version);
        match (self.contact_url.is_empty(), self.contact_email.is_empty()) {
            (true, true) => product,
            (false, true) => format!("{} (+{})", product, self.contact_url),
            (true, false) => format!("{} ({})", product, self.contact_email),
            (false, false) => format!(
                "{} (+{}; {})",
                product, self.contact_url, self.contact_email
            ),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite result store
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Default path for the markdown summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,

    /// Default path for the product CSV export
    #[serde(rename = "csv-path", default)]
    pub csv_path: Option<String>,
}
