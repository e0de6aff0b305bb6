//! Storage layer for the settlement service.
//!
//! # Tables
//!
//! - `products` - catalog + per-product available inventory
//! - `users` - wallet address to account mapping (`wallet_address` UNIQUE)
//! - `orders` - order ledger (`tx_hash` UNIQUE - the idempotency key)
//! - `order_items` - captured lines, one row per product per order
//! - `wishlists` - saved products per user (`(user_id, product_id)` UNIQUE)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p stablefront-cli -- migrate
//! ```
//!
//! # Backends
//!
//! All exclusion the settlement protocol relies on is expressed as
//! storage-level conditional or unique operations, so the [`SettlementStore`]
//! trait methods are each a single atomic step from the caller's point of
//! view. Two backends exist: [`postgres::PgStore`] for production and
//! [`memory::MemoryStore`] for tests and local development.

pub mod memory;
pub mod orders;
pub mod postgres;
pub mod products;
pub mod users;
pub mod wishlists;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use stablefront_core::{OrderId, OrderStatus, ProductId, TxHash, UserId, WalletAddress};

use crate::models::{NewOrder, NewOrderItem, Order, OrderView, Product, ProductFilter, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate transaction hash).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Storage operations the settlement protocol is built on.
///
/// Each method is atomic at the storage layer:
/// - [`reserve_inventory`](Self::reserve_inventory) is a conditional
///   decrement - the single hard concurrency invariant of the system.
/// - [`find_or_create_user`](Self::find_or_create_user) relies on the unique
///   wallet constraint; a create collision falls back to a re-read.
/// - [`create_order`](Self::create_order) fails with
///   [`RepositoryError::Conflict`] when the transaction hash has been seen
///   before; it never silently overwrites.
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Check the backend is reachable (readiness probe).
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// List catalog products matching the filter.
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError>;

    /// Look up one product by SKU.
    async fn product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Atomically decrement inventory if at least `quantity` is available.
    ///
    /// Returns `true` iff the decrement was applied. Never leaves inventory
    /// negative and never partially applies.
    async fn reserve_inventory(
        &self,
        id: &ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError>;

    /// Look up a user by wallet address.
    async fn find_user(&self, wallet: &WalletAddress) -> Result<Option<User>, RepositoryError>;

    /// Get the user for a wallet address, creating it on first sight.
    ///
    /// Race-safe: concurrent first-time calls for the same wallet resolve to
    /// the same row.
    async fn find_or_create_user(&self, wallet: &WalletAddress) -> Result<User, RepositoryError>;

    /// Create an order shell.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if an order with the same
    /// transaction hash already exists.
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    /// Persist captured order lines for an existing order.
    async fn insert_order_items(
        &self,
        order_id: OrderId,
        items: &[NewOrderItem],
    ) -> Result<(), RepositoryError>;

    /// Look up a composed order by its settlement transaction hash.
    async fn order_by_tx_hash(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Option<OrderView>, RepositoryError>;

    /// Re-read a composed order (lines + product snapshots).
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the order does not exist.
    async fn order_view(&self, id: OrderId) -> Result<OrderView, RepositoryError>;

    /// All orders for a wallet, newest first, with expanded lines.
    async fn orders_by_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<OrderView>, RepositoryError>;

    /// Overwrite an order's status (external fulfillment process).
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the order does not exist.
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError>;

    /// Save a product to a user's wishlist. Returns `true` iff newly added.
    async fn add_to_wishlist(
        &self,
        user_id: UserId,
        product_id: &ProductId,
    ) -> Result<bool, RepositoryError>;

    /// Remove a product from a user's wishlist. Returns `true` iff a row was
    /// removed.
    async fn remove_from_wishlist(
        &self,
        user_id: UserId,
        product_id: &ProductId,
    ) -> Result<bool, RepositoryError>;

    /// All wishlisted products for a user, oldest saved first.
    async fn wishlist(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a sqlx error to [`RepositoryError::Conflict`] when it is a unique
/// violation, passing everything else through as a database error.
fn map_unique_violation(err: sqlx::Error, conflict: impl FnOnce() -> String) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(conflict())
        }
        _ => RepositoryError::Database(err),
    }
}
