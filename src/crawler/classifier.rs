//! Category classification from URL path structure

use percent_encoding::percent_decode_str;
use url::Url;

/// Derives `(category, subcategory)` from a product detail URL
///
/// The second-to-last non-empty path segment is the category and the last
/// one is the subcategory. Paths with fewer than two segments yield `None`.
/// Segments are percent-decoded.
///
/// # Examples
///
/// ```
/// use storefront_crawler::crawler::classify;
/// use url::Url;
///
/// let url = Url::parse("https://x.test/shoes/running").unwrap();
/// assert_eq!(
///     classify(&url),
///     Some(("shoes".to_string(), "running".to_string()))
/// );
///
/// assert_eq!(classify(&Url::parse("https://x.test/shoes").unwrap()), None);
/// ```
pub fn classify(url: &Url) -> Option<(String, String)> {
    let segments: Vec<String> = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .map(decode_segment)
        .collect();

    match segments.as_slice() {
        [.., category, subcategory] => Some((category.clone(), subcategory.clone())),
        _ => None,
    }
}

/// Percent-decodes a path segment, keeping it raw if it is not valid UTF-8
fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}
