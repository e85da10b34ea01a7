use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use url::Url;

/// Number of hex characters kept from the detail URL digest
const PRODUCT_ID_LEN: usize = 16;

/// A single product record extracted from a store page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stable identity derived from the normalized detail URL
    pub id: String,

    pub name: String,

    pub price: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,

    /// Discount in percent, rounded to a whole number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    pub detail_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Free-form specification table (e.g. "Material" -> "Leather")
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specifications: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
}

/// Derives the product id for a detail URL
///
/// The URL is expected to be normalized already so that two navigation
/// paths to the same product collapse to one id.
///
/// # Examples
///
/// ```
/// use storefront_crawler::model::product_id;
/// use url::Url;
///
/// let a = product_id(&Url::parse("https://store.test/shoes/runner-1").unwrap());
/// let b = product_id(&Url::parse("https://store.test/shoes/runner-1").unwrap());
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 16);
/// ```
pub fn product_id(detail_url: &Url) -> String {
    let digest = Sha256::digest(detail_url.as_str().as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(PRODUCT_ID_LEN);
    id
}

/// Accumulates candidate fields before a [`Product`] is finalized
///
/// Extraction fills in whatever a page offers; [`ProductBuilder::build`]
/// drops candidates that lack a name, a price or a detail URL.
#[derive(Debug, Clone, Default)]
pub struct ProductBuilder {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub discount: Option<f64>,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub detail_url: Option<Url>,
    pub in_stock: Option<bool>,
    pub rating: Option<f64>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub specifications: BTreeMap<String, String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

impl ProductBuilder {
    /// Returns the detail URL if the candidate has one
    pub fn detail_url(&self) -> Option<&Url> {
        self.detail_url.as_ref()
    }

    /// Returns true if the candidate carries the fields a product needs
    pub fn is_complete(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
            && self.price.is_some()
            && self.detail_url.is_some()
    }

    /// Finalizes the candidate into a product
    ///
    /// Returns `None` when name, price or detail URL is missing.
    pub fn build(self) -> Option<Product> {
        if !self.is_complete() {
            return None;
        }

        let name = self.name?.trim().to_string();
        let price = self.price?;
        let detail_url = self.detail_url?;

        let discount = self.discount.or_else(|| {
            self.original_price
                .filter(|original| *original > price && *original > 0.0)
                .map(|original| ((original - price) / original * 100.0).round())
        });

        Some(Product {
            id: product_id(&detail_url),
            name,
            price,
            original_price: self.original_price,
            discount,
            currency: self.currency,
            image_url: self.image_url,
            detail_url: detail_url.to_string(),
            in_stock: self.in_stock,
            rating: self.rating,
            brand: self.brand,
            sku: self.sku,
            description: self.description,
            specifications: self.specifications,
            category: self.category,
            subcategory: self.subcategory,
        })
    }
}
