//! Product CSV export
//!
//! One row per product, in result order. Fields are quoted when they contain
//! a comma, a quote or a line break; specifications are flattened into a
//! single `key=value; key=value` column.

use crate::model::Product;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Column header line of the export
pub const CSV_HEADER: &str = "id,name,price,original_price,discount,currency,in_stock,rating,brand,sku,category,subcategory,detail_url,image_url,specifications";

/// Writes `products` as CSV to `output_path`
pub fn write_products_csv(products: &[Product], output_path: &Path) -> OutputResult<()> {
    let csv = format_products_csv(products);

    let mut file = File::create(output_path)?;
    file.write_all(csv.as_bytes())?;

    tracing::info!(
        "Wrote {} products to {}",
        products.len(),
        output_path.display()
    );
    Ok(())
}

/// Formats `products` as CSV, header line included
pub fn format_products_csv(products: &[Product]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + products.len() * 128);
    out.push_str(CSV_HEADER);
    out.push_str("\r\n");

    for product in products {
        let specifications = product
            .specifications
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ");

        let fields = [
            product.id.clone(),
            product.name.clone(),
            format_number(Some(product.price)),
            format_number(product.original_price),
            format_number(product.discount),
            product.currency.clone().unwrap_or_default(),
            product
                .in_stock
                .map(|s| s.to_string())
                .unwrap_or_default(),
            format_number(product.rating),
            product.brand.clone().unwrap_or_default(),
            product.sku.clone().unwrap_or_default(),
            product.category.clone().unwrap_or_default(),
            product.subcategory.clone().unwrap_or_default(),
            product.detail_url.clone(),
            product.image_url.clone().unwrap_or_default(),
            specifications,
        ];

        let row = fields
            .iter()
            .map(|f| escape_field(f))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&row);
        out.push_str("\r\n");
    }

    out
}

fn format_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
