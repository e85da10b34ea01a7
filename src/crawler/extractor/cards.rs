//! Generic product-card extraction for listing pages without structured data.

use super::microdata::PRODUCT_SCOPE;
use super::price::{detect_currency, parse_price};
use super::{absolute_http_url, clean_text, selector};
use crate::model::ProductBuilder;
use scraper::{ElementRef, Html};
use url::Url;

const CARD: &str = "[data-product-id], .product, .product-card, .product-item";
const NAME: &str = ".product-name, .product-title, .product__title, .name, .title, h2, h3, h4";
const PRICE: &str = ".price-current, .sale-price, .price--sale, [data-price], .price";
const ORIGINAL_PRICE: &str =
    ".price-original, .original-price, .was-price, .compare-at-price, .price--compare, del, s";
const SOLD_OUT: &str = ".out-of-stock, .sold-out, .soldout";
const BRAND: &str = ".brand, .product-brand, [data-brand]";
const RATING: &str = "[data-rating], .rating";

/// A product card together with the link it points at
#[derive(Debug)]
pub(super) struct Card {
    pub product: ProductBuilder,
    pub detail_link: Option<Url>,
}

pub(super) fn extract_cards(document: &Html, page_url: &Url) -> Vec<Card> {
    let Some(card_selector) = selector(CARD) else {
        return Vec::new();
    };
    let microdata = selector(PRODUCT_SCOPE);

    document
        .select(&card_selector)
        // Cards nested inside another card, or marked up as microdata, are
        // handled by their outer element or by the microdata pass.
        .filter(|card| !is_nested_card(*card, &card_selector))
        .filter(|card| {
            microdata
                .as_ref()
                .map_or(true, |sel| !sel.matches(card))
        })
        .map(|card| card_to_product(card, page_url))
        .collect()
}

fn is_nested_card(card: ElementRef<'_>, card_selector: &scraper::Selector) -> bool {
    card.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| card_selector.matches(&ancestor))
}

fn first_text(card: ElementRef<'_>, css: &str) -> Option<String> {
    let sel = selector(css)?;
    card.select(&sel)
        .find_map(|el| clean_text(&el.text().collect::<String>()))
}

fn first_attr(card: ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    let sel = selector(css)?;
    card.select(&sel)
        .find_map(|el| el.value().attr(attr))
        .and_then(clean_text)
}

fn card_to_product(card: ElementRef<'_>, page_url: &Url) -> Card {
    let el = card.value();
    let data = |name: &str| el.attr(name).and_then(clean_text);

    let detail_link = if el.name() == "a" {
        el.attr("href")
    } else {
        selector("a[href]").and_then(|sel| card.select(&sel).find_map(|a| a.value().attr("href")))
    }
    .and_then(|href| absolute_http_url(href, page_url));

    let anchor_title = selector("a[title]")
        .and_then(|sel| card.select(&sel).find_map(|a| a.value().attr("title")))
        .and_then(clean_text);

    let price_text = data("data-price").or_else(|| {
        first_attr(card, PRICE, "data-price").or_else(|| first_text(card, PRICE))
    });
    let original_text = data("data-original-price").or_else(|| first_text(card, ORIGINAL_PRICE));

    let image_url = selector("img")
        .and_then(|sel| {
            card.select(&sel).find_map(|img| {
                let img = img.value();
                img.attr("data-src")
                    .or_else(|| img.attr("src"))
                    .filter(|src| !src.starts_with("data:"))
            })
        })
        .and_then(|src| absolute_http_url(src, page_url))
        .map(|u| u.to_string());

    let in_stock = match data("data-in-stock").as_deref() {
        Some("true") | Some("1") | Some("yes") => Some(true),
        Some("false") | Some("0") | Some("no") => Some(false),
        _ if first_text(card, SOLD_OUT).is_some() => Some(false),
        _ => None,
    };

    let price = price_text.as_deref().and_then(parse_price);
    let product = ProductBuilder {
        name: data("data-product-name")
            .or_else(|| first_text(card, NAME))
            .or(anchor_title)
            .or_else(|| first_text(card, "a")),
        price,
        original_price: original_text
            .as_deref()
            .and_then(parse_price)
            .filter(|original| price.is_some_and(|p| *original > p)),
        currency: data("data-currency")
            .or_else(|| price_text.as_deref().and_then(detect_currency)),
        image_url,
        detail_url: detail_link.clone(),
        in_stock,
        rating: data("data-rating")
            .or_else(|| first_attr(card, RATING, "data-rating"))
            .as_deref()
            .and_then(parse_price),
        brand: data("data-brand").or_else(|| first_text(card, BRAND)),
        sku: data("data-sku"),
        ..Default::default()
    };

    Card {
        product,
        detail_link,
    }
}
