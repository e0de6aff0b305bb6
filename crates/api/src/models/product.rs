//! Product domain types.

use rust_decimal::Decimal;
use serde::Serialize;

use stablefront_core::ProductId;

/// A catalog product.
///
/// `in_stock` is an independent display flag maintained by merchandising;
/// it is *not* derived from `inventory` and may be stale. The authoritative
/// availability check is the conditional decrement on `inventory`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product SKU.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Current unit price in USD.
    pub price: Decimal,
    /// Image URL.
    pub image: String,
    /// Long description.
    pub description: String,
    /// Category slug (e.g. "hoodies").
    pub category: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Available sizes.
    pub sizes: Vec<String>,
    /// Available colors.
    pub colors: Vec<String>,
    /// Merchandising display flag; possibly stale.
    pub in_stock: bool,
    /// Whether the product is featured on the landing page.
    pub featured: bool,
    /// Units currently available.
    pub inventory: i32,
}

/// Catalog listing filter.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Only products in this category.
    pub category: Option<String>,
    /// Only products with this featured flag.
    pub featured: Option<bool>,
}

/// Parameters for inserting a product (seeding / restocking tools).
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub in_stock: bool,
    pub featured: bool,
    pub inventory: i32,
}

impl From<NewProduct> for Product {
    fn from(p: NewProduct) -> Self {
        Self {
            id: p.id,
            name: p.name,
            price: p.price,
            image: p.image,
            description: p.description,
            category: p.category,
            tags: p.tags,
            sizes: p.sizes,
            colors: p.colors,
            in_stock: p.in_stock,
            featured: p.featured,
            inventory: p.inventory,
        }
    }
}
