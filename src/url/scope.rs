use crate::url::{extract_domain, is_subdomain_of};
use crate::UrlError;
use url::Url;

/// Domain scope of a crawl
///
/// A URL is in scope iff its host equals the seed host exactly, or, when
/// subdomains are included, is a subdomain of the seed host. Scheme and
/// port are not part of the check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    seed_host: String,
    include_subdomains: bool,
}

impl Scope {
    /// Builds the scope for a seed URL
    ///
    /// # Examples
    ///
    /// ```
    /// use storefront_crawler::url::Scope;
    /// use url::Url;
    ///
    /// let seed = Url::parse("https://store.test/").unwrap();
    /// let scope = Scope::new(&seed, true).unwrap();
    ///
    /// assert!(scope.contains(&Url::parse("https://store.test/shoes").unwrap()));
    /// assert!(scope.contains(&Url::parse("https://eu.store.test/").unwrap()));
    /// assert!(!scope.contains(&Url::parse("https://other.test/").unwrap()));
    /// ```
    pub fn new(seed: &Url, include_subdomains: bool) -> Result<Self, UrlError> {
        let seed_host = extract_domain(seed).ok_or(UrlError::MissingDomain)?;
        Ok(Self {
            seed_host,
            include_subdomains,
        })
    }

    /// Returns the lowercase seed host
    pub fn seed_host(&self) -> &str {
        &self.seed_host
    }

    pub fn includes_subdomains(&self) -> bool {
        self.include_subdomains
    }

    /// Returns true if `url` may be fetched by this crawl
    pub fn contains(&self, url: &Url) -> bool {
        let Some(host) = extract_domain(url) else {
            return false;
        };

        host == self.seed_host
            || (self.include_subdomains && is_subdomain_of(&host, &self.seed_host))
    }
}
