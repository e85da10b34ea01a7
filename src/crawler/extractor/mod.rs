//! Page extraction: products, outbound links and store metadata
//!
//! Product candidates come from three sources, in order:
//! 1. schema.org JSON-LD (`Product`, arrays, `@graph`, `ItemList`)
//! 2. schema.org microdata (`itemtype=".../Product"`)
//! 3. Generic product cards (`[data-product-id]`, `.product`, `.product-card`, `.product-item`)
//!
//! A candidate without a name, a price or a detail URL is dropped. The
//! same detail URL found by more than one source is kept once, first
//! source wins.

mod cards;
mod jsonld;
mod microdata;
mod price;

pub use price::{detect_currency, parse_price};

use crate::model::{ContactInfo, ProductBuilder};
use crate::url::normalize_parsed;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Store-level metadata found on one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMeta {
    /// `og:site_name`, else the JSON-LD organization name, else `<title>`
    pub site_name: Option<String>,
    pub title: Option<String>,
    pub logo: Option<String>,
    pub description: Option<String>,
    pub contact: ContactInfo,
}

/// Everything extracted from one page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// Complete product candidates, one per detail URL
    pub products: Vec<ProductBuilder>,

    /// Detail pages of products found on this page (excluding the page itself)
    pub product_links: Vec<Url>,

    /// Every other followable link, normalized and deduplicated
    pub links: Vec<Url>,

    pub meta: PageMeta,
}

/// Parses a page into product candidates, links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
/// - Anything that is not http(s) after resolution
///
/// # Example
///
/// ```
/// use storefront_crawler::crawler::extract;
/// use url::Url;
///
/// let html = r#"<html><head><title>Shop</title></head>
///   <body><a href="/shoes">Shoes</a></body></html>"#;
/// let page = extract(html, &Url::parse("https://store.test/").unwrap());
///
/// assert_eq!(page.meta.title.as_deref(), Some("Shop"));
/// assert_eq!(page.links[0].as_str(), "https://store.test/shoes");
/// ```
pub fn extract(html: &str, page_url: &Url) -> ExtractedPage {
    let document = Html::parse_document(html);

    let jsonld = jsonld::extract_jsonld(&document, page_url);
    let microdata = microdata::extract_microdata(&document, page_url);
    let cards = cards::extract_cards(&document, page_url);

    let mut seen = HashSet::new();
    let mut products = Vec::new();
    let mut product_links = Vec::new();

    let mut card_links = Vec::new();
    let card_products = cards.into_iter().map(|card| {
        if let Some(link) = card.detail_link {
            card_links.push(link);
        }
        card.product
    });

    let candidates: Vec<ProductBuilder> = jsonld
        .products
        .into_iter()
        .chain(microdata)
        .chain(card_products)
        .collect();

    for candidate in candidates {
        if !candidate.is_complete() {
            continue;
        }
        let Some(detail) = candidate.detail_url().cloned() else {
            continue;
        };
        if seen.insert(detail.clone()) {
            if detail != *page_url {
                product_links.push(detail);
            }
            products.push(candidate);
        }
    }

    // Cards link to detail pages even when the card itself lacks a price.
    let mut linked: HashSet<Url> = product_links.iter().cloned().collect();
    for link in card_links {
        if link != *page_url && linked.insert(link.clone()) {
            product_links.push(link);
        }
    }

    let links = extract_links(&document, page_url)
        .into_iter()
        .filter(|link| !linked.contains(link) && link != page_url)
        .fold(Vec::new(), |mut acc, link| {
            if !acc.contains(&link) {
                acc.push(link);
            }
            acc
        });

    let mut meta = extract_meta(&document, page_url);
    if meta.site_name.is_none() {
        meta.site_name = jsonld.organization.name.or_else(|| meta.title.clone());
    }
    if meta.logo.is_none() {
        meta.logo = jsonld.organization.logo;
    }
    // Structured data is preferred over scraped anchors.
    let mut contact = jsonld.organization.contact;
    contact.fill_from(&meta.contact);
    meta.contact = contact;

    ExtractedPage {
        products,
        product_links,
        links,
        meta,
    }
}

pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Collapses whitespace; returns `None` for blank text
pub(crate) fn clean_text(text: &str) -> Option<String> {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Resolves `raw` against `base` and normalizes it; http(s) only
pub(crate) fn absolute_http_url(raw: &str, base: &Url) -> Option<Url> {
    let joined = base.join(raw.trim()).ok()?;
    normalize_parsed(joined).ok()
}

/// Extracts all followable links from the document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Some(a_selector) = selector("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    if let Some(canonical_selector) = selector("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid or non-HTTP(S) URLs
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    absolute_http_url(href, base_url)
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .find_map(|el| el.value().attr("content"))
        .and_then(clean_text)
}

fn extract_meta(document: &Html, page_url: &Url) -> PageMeta {
    let title = selector("title").and_then(|sel| {
        document
            .select(&sel)
            .next()
            .and_then(|el| clean_text(&el.text().collect::<String>()))
    });

    let logo = selector(".logo img, img.logo, #logo img, img#logo, header img[alt*='logo']")
        .and_then(|sel| {
            document
                .select(&sel)
                .find_map(|img| img.value().attr("src"))
        })
        .and_then(|src| absolute_http_url(src, page_url))
        .map(|u| u.to_string());

    PageMeta {
        site_name: meta_content(document, r#"meta[property="og:site_name"]"#),
        title,
        logo,
        description: meta_content(document, r#"meta[name="description"]"#)
            .or_else(|| meta_content(document, r#"meta[property="og:description"]"#)),
        contact: extract_contact(document),
    }
}

fn extract_contact(document: &Html) -> ContactInfo {
    let href_value = |prefix: &str| {
        let sel = selector(&format!(r#"a[href^="{}"]"#, prefix))?;
        document.select(&sel).find_map(|a| {
            let href = a.value().attr("href")?;
            let value = href[prefix.len()..].split('?').next().unwrap_or("");
            clean_text(value)
        })
    };

    let address = selector("address").and_then(|sel| {
        document
            .select(&sel)
            .find_map(|el| clean_text(&el.text().collect::<Vec<_>>().join(" ")))
    });

    ContactInfo {
        phone: href_value("tel:"),
        email: href_value("mailto:"),
        address,
    }
}
