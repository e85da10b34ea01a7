//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including statistics, the category taxonomy and store details.

use crate::model::ScrapeResult;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Products listed in the summary table before it is truncated
const MAX_LISTED_PRODUCTS: usize = 50;

/// Generates a markdown summary of a crawl result
///
/// # Arguments
///
/// * `result` - The finished crawl result
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(result: &ScrapeResult, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(result);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl result as markdown
pub fn format_markdown_summary(result: &ScrapeResult) -> String {
    let mut md = String::new();

    let title = result
        .store_info
        .as_ref()
        .map(|s| s.name.as_str())
        .unwrap_or(result.seed_url.as_str());
    md.push_str(&format!("# Crawl Summary: {}\n\n", title));

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed URL**: {}\n", result.seed_url));
    md.push_str(&format!("- **Scraped At**: {}\n", result.scraped_at.to_rfc3339()));
    md.push_str(&format!("- **Outcome**: {}\n", result.outcome));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        result.stats.elapsed_ms as f64 / 1000.0
    ));
    if let Some(error) = &result.error {
        md.push_str(&format!("- **Error**: {}\n", error));
    }
    md.push('\n');

    md.push_str("## Overall Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Products | {} |\n", result.products.len()));
    md.push_str(&format!(
        "| Estimated Total | {} |\n",
        result.total_products_estimate
    ));
    md.push_str(&format!(
        "| Has More Products | {} |\n",
        if result.has_more_products { "yes" } else { "no" }
    ));
    md.push_str(&format!("| Pages Visited | {} |\n", result.stats.pages_visited));
    md.push_str(&format!("| Pages Failed | {} |\n", result.stats.pages_failed));
    md.push_str(&format!(
        "| Links Out Of Scope | {} |\n",
        result.stats.links_out_of_scope
    ));
    md.push_str(&format!(
        "| Links Disallowed | {} |\n",
        result.stats.links_disallowed
    ));
    md.push_str(&format!(
        "| URLs Dropped By Limit | {} |\n",
        result.stats.urls_dropped_by_limit
    ));
    md.push_str(&format!(
        "| Duplicate Products | {} |\n\n",
        result.stats.duplicate_products
    ));

    if let Some(store) = &result.store_info {
        md.push_str("## Store\n\n");
        md.push_str(&format!("- **Name**: {}\n", store.name));
        md.push_str(&format!("- **URL**: {}\n", store.url));
        if let Some(description) = &store.description {
            md.push_str(&format!("- **Description**: {}\n", description));
        }
        if let Some(logo) = &store.logo {
            md.push_str(&format!("- **Logo**: {}\n", logo));
        }
        if let Some(contact) = &result.contact_info {
            if let Some(phone) = &contact.phone {
                md.push_str(&format!("- **Phone**: {}\n", phone));
            }
            if let Some(email) = &contact.email {
                md.push_str(&format!("- **Email**: {}\n", email));
            }
            if let Some(address) = &contact.address {
                md.push_str(&format!("- **Address**: {}\n", address));
            }
        }
        md.push('\n');

        if !store.categories.is_empty() {
            md.push_str("## Categories\n\n");
            for category in &store.categories {
                match store.subcategories.get(category) {
                    Some(subs) if !subs.is_empty() => {
                        md.push_str(&format!("- {}: {}\n", category, subs.join(", ")));
                    }
                    _ => md.push_str(&format!("- {}\n", category)),
                }
            }
            md.push('\n');
        }
    }

    if !result.products.is_empty() {
        md.push_str("## Products\n\n");
        md.push_str("| Name | Price | Category | URL |\n");
        md.push_str("|------|-------|----------|-----|\n");

        for product in result.products.iter().take(MAX_LISTED_PRODUCTS) {
            let price = match &product.currency {
                Some(currency) => format!("{:.2} {}", product.price, currency),
                None => format!("{:.2}", product.price),
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                product.name.replace('|', "\\|"),
                price,
                product.category.as_deref().unwrap_or("-"),
                product.detail_url
            ));
        }
        if result.products.len() > MAX_LISTED_PRODUCTS {
            md.push_str(&format!(
                "\n... and {} more\n",
                result.products.len() - MAX_LISTED_PRODUCTS
            ));
        }
        md.push('\n');
    }

    md
}
