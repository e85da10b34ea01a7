use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate description of the crawled store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreInfo {
    pub name: String,

    /// Root URL the crawl was seeded with
    pub url: String,

    /// Every category seen across the crawl, sorted
    pub categories: Vec<String>,

    /// Subcategories seen per category, each list sorted
    pub subcategories: BTreeMap<String, Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Contact details scraped from the store, all optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ContactInfo {
    /// Returns true if no contact field was found
    pub fn is_empty(&self) -> bool {
        self.phone.is_none() && self.email.is_none() && self.address.is_none()
    }

    /// Fills fields that are still unset from `other`
    ///
    /// Values already present are kept, so the first page that mentions a
    /// phone number or email wins.
    pub fn fill_from(&mut self, other: &ContactInfo) {
        if self.phone.is_none() {
            self.phone = other.phone.clone();
        }
        if self.email.is_none() {
            self.email = other.email.clone();
        }
        if self.address.is_none() {
            self.address = other.address.clone();
        }
    }
}
