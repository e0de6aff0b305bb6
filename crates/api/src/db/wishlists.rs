//! Database operations for user wishlists.
//!
//! A wishlist row is a `(user, product)` pair; the unique constraint makes
//! `add` idempotent and the booleans report whether a row actually changed,
//! matching the ledger-style "applied or not" results elsewhere in this
//! module tree.

use sqlx::PgPool;

use stablefront_core::{ProductId, UserId};

use super::RepositoryError;
use super::products::ProductRow;
use crate::models::Product;

/// Save a product to a user's wishlist.
///
/// Returns `true` iff the product was newly added.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn add(
    pool: &PgPool,
    user_id: UserId,
    product_id: &ProductId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "INSERT INTO wishlists (user_id, product_id)
         VALUES ($1, $2)
         ON CONFLICT (user_id, product_id) DO NOTHING",
    )
    .bind(user_id.as_uuid())
    .bind(product_id.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Remove a product from a user's wishlist.
///
/// Returns `true` iff a row was removed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn remove(
    pool: &PgPool,
    user_id: UserId,
    product_id: &ProductId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "DELETE FROM wishlists
         WHERE user_id = $1 AND product_id = $2",
    )
    .bind(user_id.as_uuid())
    .bind(product_id.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// All wishlisted products for a user, oldest saved first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list(pool: &PgPool, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT p.id, p.name, p.price, p.image, p.description, p.category,
                p.tags, p.sizes, p.colors, p.in_stock, p.featured, p.inventory
         FROM wishlists w
         JOIN products p ON p.id = w.product_id
         WHERE w.user_id = $1
         ORDER BY w.created_at",
    )
    .bind(user_id.as_uuid())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}
