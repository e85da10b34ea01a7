//! Robots.txt rules, matched with the robotstxt crate

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Parsed robots.txt data
///
/// Matching is delegated to [`DefaultMatcher`]; only the `Crawl-delay`
/// extension is read here, since the matcher ignores it.
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    /// Raw robots.txt content; `None` allows everything
    content: Option<String>,
}

impl RobotsRules {
    /// Creates rules from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
        }
    }

    /// Rules that allow every URL
    ///
    /// Used when robots.txt is missing or could not be fetched.
    pub fn allow_all() -> Self {
        Self { content: None }
    }

    /// Returns true if these rules never disallow anything
    pub fn is_allow_all(&self) -> bool {
        self.content.as_deref().map_or(true, |c| c.trim().is_empty())
    }

    /// Checks whether `agent` may fetch `url`
    ///
    /// `url` may be a full URL or a path such as `/page.html`.
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        let Some(content) = self.content.as_deref().filter(|c| !c.trim().is_empty()) else {
            return true;
        };

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(content, agent, url)
    }

    /// Returns the `Crawl-delay` that applies to `agent`
    ///
    /// A group naming the agent takes precedence over the `*` group.
    pub fn crawl_delay(&self, agent: &str) -> Option<Duration> {
        let content = self.content.as_deref()?;
        let agent = agent.to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut for_agent = None;
        let mut for_wildcard = None;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                // Consecutive user-agent lines share one group.
                if !in_agent_lines {
                    group.clear();
                }
                group.push(value.to_lowercase());
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }
            let Some(delay) = value
                .parse::<f64>()
                .ok()
                .filter(|d| d.is_finite() && *d >= 0.0)
            else {
                continue;
            };

            if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                for_agent = Some(delay);
            } else if group.iter().any(|ua| ua == "*") {
                for_wildcard = Some(delay);
            }
        }

        for_agent
            .or(for_wildcard)
            .map(Duration::from_secs_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let robots = RobotsRules::allow_all();
        assert!(robots.is_allow_all());
        assert!(robots.is_allowed("/any/path", "TestBot"));
        assert!(robots.is_allowed("/admin", "TestBot"));
    }

    #[test]
    fn test_parse_disallow_all() {
        let robots = RobotsRules::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed("/", "TestBot"));
        assert!(!robots.is_allowed("https://store.test/page", "TestBot"));
    }

    #[test]
    fn test_parse_disallow_specific() {
        let robots = RobotsRules::from_content("User-agent: *\nDisallow: /checkout");
        assert!(robots.is_allowed("https://store.test/", "TestBot"));
        assert!(robots.is_allowed("https://store.test/shoes", "TestBot"));
        assert!(!robots.is_allowed("https://store.test/checkout", "TestBot"));
        assert!(!robots.is_allowed("https://store.test/checkout/pay", "TestBot"));
    }

    #[test]
    fn test_parse_allow_and_disallow() {
        let robots =
            RobotsRules::from_content("User-agent: *\nDisallow: /account\nAllow: /account/login");
        assert!(!robots.is_allowed("/account", "TestBot"));
        assert!(robots.is_allowed("/account/login", "TestBot"));
    }

    #[test]
    fn test_parse_specific_user_agent() {
        let robots = RobotsRules::from_content("User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(robots.is_allowed("/page", "GoodBot"));
        assert!(!robots.is_allowed("/page", "BadBot"));
    }

    #[test]
    fn test_garbage_allows_everything() {
        let robots = RobotsRules::from_content("This is not valid robots.txt {{{");
        assert!(robots.is_allowed("/any/path", "TestBot"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let robots = RobotsRules::from_content("User-agent: *\nCrawl-delay: 10\nDisallow: /admin");
        assert_eq!(robots.crawl_delay("TestBot"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_specific_agent_wins() {
        let robots = RobotsRules::from_content(
            "User-agent: *\nCrawl-delay: 10\n\nUser-agent: TestBot\nCrawl-delay: 5",
        );
        assert_eq!(robots.crawl_delay("TestBot"), Some(Duration::from_secs(5)));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_grouped_agents() {
        let robots = RobotsRules::from_content("User-agent: BotA\nUser-agent: BotB\nCrawl-delay: 3");
        assert_eq!(robots.crawl_delay("BotB"), Some(Duration::from_secs(3)));
        assert_eq!(robots.crawl_delay("BotC"), None);
    }

    #[test]
    fn test_crawl_delay_decimal_and_comments() {
        let robots = RobotsRules::from_content("User-agent: * # everyone\nCrawl-delay: 2.5 # slow down");
        assert_eq!(
            robots.crawl_delay("TestBot"),
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn test_no_crawl_delay() {
        assert_eq!(
            RobotsRules::from_content("User-agent: *\nDisallow: /admin").crawl_delay("TestBot"),
            None
        );
        assert_eq!(RobotsRules::allow_all().crawl_delay("TestBot"), None);
    }
}
