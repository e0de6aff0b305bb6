//! Database operations for the product catalog and inventory ledger.
//!
//! Queries use runtime-checked binds so the crate builds without a live
//! database; row structs derive `sqlx::FromRow` and convert into domain
//! types.

use rust_decimal::Decimal;
use sqlx::PgPool;

use stablefront_core::ProductId;

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductFilter};

/// Internal row type for product queries (also reused by the wishlist join).
#[derive(Debug, sqlx::FromRow)]
pub(super) struct ProductRow {
    id: String,
    name: String,
    price: Decimal,
    image: String,
    description: String,
    category: String,
    tags: Vec<String>,
    sizes: Vec<String>,
    colors: Vec<String>,
    in_stock: bool,
    featured: bool,
    inventory: i32,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            price: row.price,
            image: row.image,
            description: row.description,
            category: row.category,
            tags: row.tags,
            sizes: row.sizes,
            colors: row.colors,
            in_stock: row.in_stock,
            featured: row.featured,
            inventory: row.inventory,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, price, image, description, category, \
     tags, sizes, colors, in_stock, featured, inventory";

/// List products, optionally filtered by category and/or featured flag.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list(pool: &PgPool, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS}
         FROM products
         WHERE ($1::TEXT IS NULL OR category = $1)
           AND ($2::BOOLEAN IS NULL OR featured = $2)
         ORDER BY name"
    );

    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(filter.category.as_deref())
        .bind(filter.featured)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Get one product by SKU.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(pool: &PgPool, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");

    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Into::into))
}

/// Atomically reserve inventory for a product.
///
/// Single conditional update: the decrement is applied iff at least
/// `quantity` units are available at execution time, so two concurrent
/// reservations can never jointly oversell a product.
///
/// Returns `true` iff the reservation was applied.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn reserve(
    pool: &PgPool,
    id: &ProductId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE products
         SET inventory = inventory - $2, updated_at = now()
         WHERE id = $1 AND inventory >= $2",
    )
    .bind(id.as_str())
    .bind(quantity)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Insert a product, skipping SKUs that already exist (catalog seeding).
///
/// Returns `true` iff a row was inserted.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(pool: &PgPool, product: &NewProduct) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "INSERT INTO products
             (id, name, price, image, description, category,
              tags, sizes, colors, in_stock, featured, inventory)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(product.id.as_str())
    .bind(&product.name)
    .bind(product.price)
    .bind(&product.image)
    .bind(&product.description)
    .bind(&product.category)
    .bind(&product.tags)
    .bind(&product.sizes)
    .bind(&product.colors)
    .bind(product.in_stock)
    .bind(product.featured)
    .bind(product.inventory)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
