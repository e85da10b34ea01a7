use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use storefront_crawler::url::extract_domain;
///
/// let url = Url::parse("https://SHOP.Store.test:8443/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("shop.store.test".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}

/// Returns true if `candidate` is a strict subdomain of `base`
///
/// Both arguments must already be lowercase. `base` itself is not a
/// subdomain of `base`, and a suffix that does not fall on a label boundary
/// (`mystore.test` vs `store.test`) does not match.
///
/// # Examples
///
/// ```
/// use storefront_crawler::url::is_subdomain_of;
///
/// assert!(is_subdomain_of("shop.store.test", "store.test"));
/// assert!(!is_subdomain_of("store.test", "store.test"));
/// assert!(!is_subdomain_of("mystore.test", "store.test"));
/// ```
pub fn is_subdomain_of(candidate: &str, base: &str) -> bool {
    candidate.len() > base.len() + 1
        && candidate.ends_with(base)
        && candidate.as_bytes()[candidate.len() - base.len() - 1] == b'.'
}
