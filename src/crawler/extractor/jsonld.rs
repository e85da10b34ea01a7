//! schema.org JSON-LD extraction.

use super::price::{detect_currency, price_from_json};
use super::{absolute_http_url, clean_text};
use crate::model::{ContactInfo, ProductBuilder};
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

/// Organization-level data declared by a page
#[derive(Debug, Clone, Default)]
pub(super) struct JsonLdOrganization {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub contact: ContactInfo,
}

/// Everything JSON-LD contributed for one page
#[derive(Debug, Default)]
pub(super) struct JsonLdData {
    pub products: Vec<ProductBuilder>,
    pub organization: JsonLdOrganization,
}

/// Parses every `<script type="application/ld+json">` block of a page
pub(super) fn extract_jsonld(document: &Html, page_url: &Url) -> JsonLdData {
    let mut data = JsonLdData::default();
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return data;
    };

    for script in document.select(&selector) {
        let text = script.text().collect::<String>();
        let value: Value = match serde_json::from_str(text.trim()) {
            Ok(v) => v,
            Err(e) => {
                tracing::trace!("Skipping invalid JSON-LD on {}: {}", page_url, e);
                continue;
            }
        };

        let mut nodes = Vec::new();
        collect_nodes(&value, &mut nodes);

        for node in nodes {
            if has_type(node, &["Product", "ProductGroup", "IndividualProduct"]) {
                data.products.push(product_from_node(node, page_url));
            } else if has_type(
                node,
                &["Organization", "OnlineStore", "Store", "LocalBusiness", "WebSite"],
            ) {
                merge_organization(&mut data.organization, node, page_url);
            }
        }
    }

    data
}

/// Flattens arrays, `@graph` containers and `ItemList` elements
fn collect_nodes<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_nodes(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                collect_nodes(graph, out);
            }

            if has_type(value, &["ItemList"]) {
                if let Some(elements) = map.get("itemListElement") {
                    collect_list_elements(elements, out);
                }
            }

            if map.contains_key("@type") {
                out.push(value);
            }
        }
        _ => {}
    }
}

fn collect_list_elements<'a>(elements: &'a Value, out: &mut Vec<&'a Value>) {
    let items = match elements {
        Value::Array(items) => items.as_slice(),
        other => std::slice::from_ref(other),
    };

    for element in items {
        // ListItem wraps the product in `item`; bare products are also common.
        match element.get("item") {
            Some(item) if item.is_object() => collect_nodes(item, out),
            _ => collect_nodes(element, out),
        }
    }
}

/// Returns true if `@type` is (or contains) one of `accepted`
fn has_type(node: &Value, accepted: &[&str]) -> bool {
    let Some(type_node) = node.get("@type") else {
        return false;
    };

    let matches = |s: &str| {
        let s = s.rsplit('/').next().unwrap_or(s);
        accepted.iter().any(|t| s.eq_ignore_ascii_case(t))
    };

    match type_node {
        Value::String(s) => matches(s),
        Value::Array(types) => types.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

fn string_field(node: &Value, key: &str) -> Option<String> {
    match node.get(key)? {
        Value::String(s) => clean_text(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a field that may be a string, a `{ "name": .. }` object or an array
fn named_field(node: &Value, key: &str) -> Option<String> {
    match node.get(key)? {
        Value::String(s) => clean_text(s),
        Value::Object(_) => string_field(node.get(key)?, "name"),
        Value::Array(items) => items.iter().find_map(|item| match item {
            Value::String(s) => clean_text(s),
            Value::Object(_) => string_field(item, "name"),
            _ => None,
        }),
        _ => None,
    }
}

/// Reads an image that may be a string, an `ImageObject` or an array
fn image_field(node: &Value, key: &str, page_url: &Url) -> Option<String> {
    let raw = match node.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => string_field(node.get(key)?, "url"),
        Value::Array(items) => items.iter().find_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => string_field(item, "url"),
            _ => None,
        }),
        _ => None,
    }?;
    absolute_http_url(&raw, page_url).map(|u| u.to_string())
}

fn product_from_node(node: &Value, page_url: &Url) -> ProductBuilder {
    let mut builder = ProductBuilder {
        name: string_field(node, "name"),
        description: string_field(node, "description"),
        sku: string_field(node, "sku").or_else(|| string_field(node, "mpn")),
        brand: named_field(node, "brand"),
        image_url: image_field(node, "image", page_url),
        ..Default::default()
    };

    builder.detail_url = string_field(node, "url")
        .and_then(|raw| absolute_http_url(&raw, page_url))
        .or_else(|| absolute_http_url(page_url.as_str(), page_url));

    if let Some(offer) = first_offer(node) {
        builder.price = offer
            .get("price")
            .and_then(price_from_json)
            .or_else(|| offer.get("lowPrice").and_then(price_from_json));
        builder.currency = string_field(offer, "priceCurrency").or_else(|| {
            offer
                .get("price")
                .and_then(Value::as_str)
                .and_then(detect_currency)
        });
        builder.in_stock = string_field(offer, "availability").and_then(|a| availability(&a));

        // A strike-through price is published as a price specification.
        builder.original_price = offer
            .get("priceSpecification")
            .and_then(|spec| match spec {
                Value::Array(items) => items.iter().find_map(list_price),
                other => list_price(other),
            })
            .filter(|original| builder.price.is_some_and(|p| *original > p));
    }

    builder.rating = node
        .get("aggregateRating")
        .and_then(|r| r.get("ratingValue"))
        .and_then(price_from_json);

    if let Some(category) = string_field(node, "category") {
        let mut parts = category
            .split(['>', '/'])
            .map(str::trim)
            .filter(|s| !s.is_empty());
        builder.category = parts.next().map(str::to_string);
        builder.subcategory = parts.next().map(str::to_string);
    }

    if let Some(Value::Array(properties)) = node.get("additionalProperty") {
        for property in properties {
            if let (Some(name), Some(value)) =
                (string_field(property, "name"), string_field(property, "value"))
            {
                builder.specifications.entry(name).or_insert(value);
            }
        }
    }

    builder
}

fn first_offer(node: &Value) -> Option<&Value> {
    match node.get("offers")? {
        Value::Array(offers) => offers.first(),
        offer @ Value::Object(_) => {
            // AggregateOffer may nest its individual offers.
            match offer.get("offers") {
                Some(Value::Array(inner)) if offer.get("lowPrice").is_none() => {
                    inner.first().or(Some(offer))
                }
                _ => Some(offer),
            }
        }
        _ => None,
    }
}

fn list_price(spec: &Value) -> Option<f64> {
    let kind = string_field(spec, "priceType").unwrap_or_default();
    if kind.contains("ListPrice") || kind.contains("StrikethroughPrice") {
        spec.get("price").and_then(price_from_json)
    } else {
        None
    }
}

/// Maps a schema.org availability URL to an in-stock flag
pub(super) fn availability(value: &str) -> Option<bool> {
    let tail = value.rsplit('/').next().unwrap_or(value).to_ascii_lowercase();
    match tail.as_str() {
        "instock" | "limitedavailability" | "onlineonly" | "instoreonly" | "preorder"
        | "presale" => Some(true),
        "outofstock" | "soldout" | "discontinued" => Some(false),
        _ => None,
    }
}

fn merge_organization(org: &mut JsonLdOrganization, node: &Value, page_url: &Url) {
    if org.name.is_none() {
        org.name = string_field(node, "name");
    }
    if org.logo.is_none() {
        org.logo = image_field(node, "logo", page_url);
    }

    let contact_point = node.get("contactPoint").and_then(|c| match c {
        Value::Array(points) => points.first(),
        other => Some(other),
    });

    let found = ContactInfo {
        phone: string_field(node, "telephone")
            .or_else(|| contact_point.and_then(|c| string_field(c, "telephone"))),
        email: string_field(node, "email")
            .or_else(|| contact_point.and_then(|c| string_field(c, "email")))
            .map(|e| e.trim_start_matches("mailto:").to_string()),
        address: node.get("address").and_then(format_address),
    };
    org.contact.fill_from(&found);
}

/// Formats a `PostalAddress` (or a plain string) on one line
fn format_address(address: &Value) -> Option<String> {
    match address {
        Value::String(s) => clean_text(s),
        Value::Object(_) => {
            let parts: Vec<String> = [
                "streetAddress",
                "addressLocality",
                "addressRegion",
                "postalCode",
                "addressCountry",
            ]
            .iter()
            .filter_map(|key| named_field(address, key))
            .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Array(items) => items.iter().find_map(format_address),
        _ => None,
    }
}
