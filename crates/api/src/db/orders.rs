//! Database operations for the order ledger.
//!
//! Orders are written once by the settlement coordinator and afterwards only
//! touched by status updates. Reads expand lines to current product
//! snapshots; the captured `price_at_time`/`quantity` pair stays
//! authoritative for historical totals.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use stablefront_core::{OrderId, OrderStatus, ProductId, TxHash, UserId, WalletAddress};

use super::{RepositoryError, map_unique_violation};
use crate::models::{NewOrder, NewOrderItem, Order, OrderLineView, OrderView, Product};

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    user_wallet: String,
    total_amount: Decimal,
    status: OrderStatus,
    tx_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let user_wallet = WalletAddress::parse(&row.user_wallet).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid wallet address in database: {e}"))
        })?;
        let tx_hash = TxHash::parse(&row.tx_hash).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid tx hash in database: {e}"))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            user_wallet,
            total_amount: row.total_amount,
            status: row.status,
            tx_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for order lines joined with their product snapshot.
#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    order_id: Uuid,
    quantity: i32,
    price_at_time: Decimal,
    product_id: String,
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

impl OrderLineRow {
    fn into_line(self) -> (Uuid, OrderLineView) {
        let line = OrderLineView {
            product: Product {
                id: ProductId::new(self.product_id),
                name: self.name,
                price: self.price,
                image: self.image,
                description: self.description,
                category: self.category,
                tags: self.tags,
                sizes: self.sizes,
                colors: self.colors,
                in_stock: self.in_stock,
                featured: self.featured,
                inventory: self.inventory,
            },
            quantity: self.quantity,
            price_at_time: self.price_at_time,
        };
        (self.order_id, line)
    }
}

const ORDER_COLUMNS: &str =
    "id, user_id, user_wallet, total_amount, status, tx_hash, created_at, updated_at";

const LINE_JOIN: &str = "SELECT oi.order_id, oi.quantity, oi.price_at_time,
            p.id AS product_id, p.name, p.price, p.image, p.description,
            p.category, p.tags, p.sizes, p.colors, p.in_stock, p.featured,
            p.inventory
     FROM order_items oi
     JOIN products p ON p.id = oi.product_id";

/// Create an order shell.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if an order with the same transaction
/// hash already exists (duplicate settlement).
pub async fn create(pool: &PgPool, order: NewOrder) -> Result<Order, RepositoryError> {
    let sql = format!(
        "INSERT INTO orders (user_id, user_wallet, total_amount, status, tx_hash)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {ORDER_COLUMNS}"
    );

    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(order.user_id.as_uuid())
        .bind(order.user_wallet.as_str())
        .bind(order.total_amount)
        .bind(order.status)
        .bind(order.tx_hash.as_str())
        .fetch_one(pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || format!("duplicate settlement: {}", order.tx_hash))
        })?;

    row.try_into()
}

/// Persist captured order lines for an existing order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if an insert fails.
pub async fn insert_items(
    pool: &PgPool,
    order_id: OrderId,
    items: &[NewOrderItem],
) -> Result<(), RepositoryError> {
    for item in items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, price_at_time)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(order_id.as_uuid())
        .bind(item.product_id.as_str())
        .bind(item.quantity)
        .bind(item.price_at_time)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Look up a composed order by transaction hash.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn find_by_tx_hash(
    pool: &PgPool,
    tx_hash: &TxHash,
) -> Result<Option<OrderView>, RepositoryError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE tx_hash = $1");

    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(tx_hash.as_str())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let order: Order = row.try_into()?;
            let composed = compose(pool, vec![order]).await?;
            Ok(composed.into_iter().next())
        }
        None => Ok(None),
    }
}

/// Re-read a composed order by ID.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order does not exist.
pub async fn view(pool: &PgPool, id: OrderId) -> Result<OrderView, RepositoryError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");

    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id.as_uuid())
        .fetch_optional(pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    let order: Order = row.try_into()?;
    compose(pool, vec![order])
        .await?
        .into_iter()
        .next()
        .ok_or(RepositoryError::NotFound)
}

/// All orders for a wallet, newest first, with expanded lines.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn list_by_wallet(
    pool: &PgPool,
    wallet: &WalletAddress,
) -> Result<Vec<OrderView>, RepositoryError> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS}
         FROM orders
         WHERE user_wallet = $1
         ORDER BY created_at DESC"
    );

    let rows = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(wallet.as_str())
        .fetch_all(pool)
        .await?;

    let orders = rows
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<Order>, _>>()?;

    compose(pool, orders).await
}

/// Overwrite an order's status.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order does not exist.
pub async fn update_status(
    pool: &PgPool,
    id: OrderId,
    status: OrderStatus,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE orders
         SET status = $2, updated_at = now()
         WHERE id = $1",
    )
    .bind(id.as_uuid())
    .bind(status)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Expand order shells into composed views, preserving input order.
async fn compose(pool: &PgPool, orders: Vec<Order>) -> Result<Vec<OrderView>, RepositoryError> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();
    let sql = format!("{LINE_JOIN} WHERE oi.order_id = ANY($1)");

    let line_rows = sqlx::query_as::<_, OrderLineRow>(&sql)
        .bind(&ids)
        .fetch_all(pool)
        .await?;

    let mut lines: HashMap<Uuid, Vec<OrderLineView>> = HashMap::new();
    for row in line_rows {
        let (order_id, line) = row.into_line();
        lines.entry(order_id).or_default().push(line);
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderView {
            items: lines.remove(&order.id.as_uuid()).unwrap_or_default(),
            id: order.id,
            user_wallet: order.user_wallet,
            total_amount: order.total_amount,
            status: order.status,
            tx_hash: order.tx_hash,
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
        .collect())
}
