//! `PostgreSQL` implementation of the settlement store.

use async_trait::async_trait;
use sqlx::PgPool;

use stablefront_core::{OrderId, OrderStatus, ProductId, TxHash, UserId, WalletAddress};

use super::{RepositoryError, SettlementStore, orders, products, users, wishlists};
use crate::models::{NewOrder, NewOrderItem, Order, OrderView, Product, ProductFilter, User};

/// Production storage backend over a `PostgreSQL` pool.
///
/// Atomicity comes from the database itself: the conditional inventory
/// decrement, the unique wallet constraint, and the unique transaction hash
/// constraint all hold across processes sharing the database.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SettlementStore for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        products::list(&self.pool, filter).await
    }

    async fn product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        products::get(&self.pool, id).await
    }

    async fn reserve_inventory(
        &self,
        id: &ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        products::reserve(&self.pool, id, quantity).await
    }

    async fn find_user(&self, wallet: &WalletAddress) -> Result<Option<User>, RepositoryError> {
        users::find_by_wallet(&self.pool, wallet).await
    }

    async fn find_or_create_user(&self, wallet: &WalletAddress) -> Result<User, RepositoryError> {
        users::find_or_create(&self.pool, wallet).await
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        orders::create(&self.pool, order).await
    }

    async fn insert_order_items(
        &self,
        order_id: OrderId,
        items: &[NewOrderItem],
    ) -> Result<(), RepositoryError> {
        orders::insert_items(&self.pool, order_id, items).await
    }

    async fn order_by_tx_hash(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Option<OrderView>, RepositoryError> {
        orders::find_by_tx_hash(&self.pool, tx_hash).await
    }

    async fn order_view(&self, id: OrderId) -> Result<OrderView, RepositoryError> {
        orders::view(&self.pool, id).await
    }

    async fn orders_by_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<OrderView>, RepositoryError> {
        orders::list_by_wallet(&self.pool, wallet).await
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        orders::update_status(&self.pool, id, status).await
    }

    async fn add_to_wishlist(
        &self,
        user_id: UserId,
        product_id: &ProductId,
    ) -> Result<bool, RepositoryError> {
        wishlists::add(&self.pool, user_id, product_id).await
    }

    async fn remove_from_wishlist(
        &self,
        user_id: UserId,
        product_id: &ProductId,
    ) -> Result<bool, RepositoryError> {
        wishlists::remove(&self.pool, user_id, product_id).await
    }

    async fn wishlist(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        wishlists::list(&self.pool, user_id).await
    }
}
