//! schema.org microdata (`itemtype=".../Product"`) extraction.

use super::jsonld::availability;
use super::price::{detect_currency, parse_price};
use super::{absolute_http_url, clean_text, selector};
use crate::model::ProductBuilder;
use scraper::{ElementRef, Html};
use url::Url;

pub(super) const PRODUCT_SCOPE: &str = r#"[itemscope][itemtype*="schema.org/Product"]"#;

pub(super) fn extract_microdata(document: &Html, page_url: &Url) -> Vec<ProductBuilder> {
    let Some(scope) = selector(PRODUCT_SCOPE) else {
        return Vec::new();
    };

    document
        .select(&scope)
        .map(|element| product_from_scope(element, page_url))
        .collect()
}

/// Reads an `itemprop` value the way microdata defines it per element
fn prop_value(element: ElementRef<'_>) -> Option<String> {
    let el = element.value();
    let raw = el
        .attr("content")
        .or_else(|| match el.name() {
            "a" | "link" | "area" => el.attr("href"),
            "img" | "source" | "video" | "audio" => el.attr("src"),
            "meta" => el.attr("content"),
            "data" | "meter" => el.attr("value"),
            "time" => el.attr("datetime"),
            _ => None,
        })
        .map(str::to_string)
        .unwrap_or_else(|| element.text().collect::<String>());
    clean_text(&raw)
}

/// Returns the first `itemprop=name` inside `scope` that belongs to it
///
/// Properties of nested items (a `Brand` or `Offer` scope) are skipped so
/// the brand name is not taken for the product name.
fn own_prop<'a>(scope: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    let sel = selector(&format!(r#"[itemprop~="{}"]"#, name))?;
    scope
        .select(&sel)
        .find(|el| belongs_to(*el, scope))
}

/// Returns any `itemprop=name` inside `scope`, nested items included
fn any_prop<'a>(scope: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    let sel = selector(&format!(r#"[itemprop~="{}"]"#, name))?;
    scope.select(&sel).next()
}

/// Returns true if the nearest enclosing item of `element` is `scope`
fn belongs_to(element: ElementRef<'_>, scope: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().attr("itemscope").is_some())
        .is_some_and(|a| a.id() == scope.id())
}

fn product_from_scope(scope: ElementRef<'_>, page_url: &Url) -> ProductBuilder {
    let own = |name: &str| own_prop(scope, name).and_then(prop_value);
    let any = |name: &str| any_prop(scope, name).and_then(prop_value);

    let price_text = any("price").or_else(|| any("lowPrice"));

    let mut builder = ProductBuilder {
        name: own("name"),
        description: own("description"),
        sku: own("sku").or_else(|| own("mpn")),
        price: price_text.as_deref().and_then(parse_price),
        currency: any("priceCurrency")
            .or_else(|| price_text.as_deref().and_then(detect_currency)),
        in_stock: any("availability").and_then(|a| availability(&a)),
        rating: any("ratingValue").as_deref().and_then(parse_price),
        ..Default::default()
    };

    builder.brand = own_prop(scope, "brand").and_then(|brand| {
        if brand.value().attr("itemscope").is_some() {
            own_prop(brand, "name").and_then(prop_value)
        } else {
            prop_value(brand)
        }
    });

    builder.image_url = own("image")
        .and_then(|raw| absolute_http_url(&raw, page_url))
        .map(|u| u.to_string());

    builder.detail_url = own("url")
        .and_then(|raw| absolute_http_url(&raw, page_url))
        .or_else(|| absolute_http_url(page_url.as_str(), page_url));

    builder
}
