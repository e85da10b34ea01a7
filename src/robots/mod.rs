//! Robots.txt handling module
//!
//! robots.txt for the seed host is fetched once when a crawl starts. A
//! missing or unreachable file allows everything.

mod parser;

pub use parser::RobotsRules;

use crate::crawler::{Fetcher, Transport};
use std::time::Duration;
use url::Url;

/// robots.txt rules bound to the agent token they are matched for
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    rules: RobotsRules,
    agent: String,
}

impl RobotsPolicy {
    pub fn new(rules: RobotsRules, agent: impl Into<String>) -> Self {
        Self {
            rules,
            agent: agent.into(),
        }
    }

    /// A policy that allows every URL
    pub fn allow_all(agent: impl Into<String>) -> Self {
        Self::new(RobotsRules::allow_all(), agent)
    }

    /// Fetches `/robots.txt` from the seed's origin
    pub async fn fetch<T: Transport>(fetcher: &Fetcher<T>, seed: &Url, agent: &str) -> Self {
        let Ok(robots_url) = seed.join("/robots.txt") else {
            return Self::allow_all(agent);
        };

        match fetcher.fetch_text(&robots_url).await {
            Ok(page) => {
                tracing::debug!("Loaded robots.txt from {}", robots_url);
                Self::new(RobotsRules::from_content(&page.body), agent)
            }
            Err(e) => {
                tracing::debug!("No usable robots.txt at {} ({}), allowing all", robots_url, e);
                Self::allow_all(agent)
            }
        }
    }

    /// Returns true if the crawl may fetch `url`
    pub fn allows(&self, url: &Url) -> bool {
        self.rules.is_allowed(url.as_str(), &self.agent)
    }

    /// Returns the `Crawl-delay` for this crawler, if any
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.rules.crawl_delay(&self.agent)
    }
}
