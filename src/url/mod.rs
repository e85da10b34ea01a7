//! URL handling module
//!
//! URL normalization, host extraction and the domain scope that decides
//! which discovered links a crawl may follow.

mod domain;
mod normalize;
mod scope;

pub use domain::{extract_domain, is_subdomain_of};
pub use normalize::{normalize_parsed, normalize_url};
pub use scope::Scope;

use crate::UrlError;
use url::Url;

/// Parses and validates a crawl seed
///
/// The seed must be an absolute http(s) URL with a host. It is returned
/// normalized so that links back to the home page dedupe against it.
///
/// # Examples
///
/// ```
/// use storefront_crawler::url::parse_seed;
///
/// assert!(parse_seed("https://store.test").is_ok());
/// assert!(parse_seed("store.test").is_err());
/// assert!(parse_seed("mailto:shop@store.test").is_err());
/// ```
pub fn parse_seed(seed: &str) -> Result<Url, UrlError> {
    let url = normalize_url(seed)?;
    if url.cannot_be_a_base() {
        return Err(UrlError::Malformed(seed.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_normalizes() {
        let url = parse_seed("  https://Store.test/?utm_source=x ").unwrap();
        assert_eq!(url.as_str(), "https://store.test/");
    }

    #[test]
    fn test_parse_seed_rejects_relative() {
        assert!(matches!(parse_seed("/shoes"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_parse_seed_rejects_other_schemes() {
        assert!(matches!(
            parse_seed("ftp://store.test/"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_parse_seed_rejects_empty() {
        assert!(parse_seed("").is_err());
    }
}
