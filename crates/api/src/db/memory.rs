//! In-memory implementation of the settlement store.
//!
//! Used by tests and local development. A single mutex serializes every
//! operation, which is strictly stronger than the per-row atomicity the
//! protocol requires, so the same invariants hold as on `PostgreSQL`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use stablefront_core::{OrderId, OrderStatus, ProductId, TxHash, UserId, WalletAddress};

use super::{RepositoryError, SettlementStore};
use crate::models::{
    NewOrder, NewOrderItem, NewProduct, Order, OrderLineView, OrderView, Product, ProductFilter,
    User,
};

/// An order shell plus its captured lines.
#[derive(Debug, Clone)]
struct StoredOrder {
    order: Order,
    items: Vec<NewOrderItem>,
}

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    /// Keyed by wallet address string (the uniqueness constraint).
    users: HashMap<String, User>,
    /// Kept in creation order; newest-first reads iterate in reverse.
    orders: Vec<StoredOrder>,
    /// Saved products per user, in insertion order.
    wishlists: HashMap<UserId, Vec<ProductId>>,
}

/// Thread-safe in-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with a catalog.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = NewProduct>) -> Self {
        let store = Self::new();
        for product in products {
            store.insert_product(product);
        }
        store
    }

    /// Insert or replace a catalog product.
    pub fn insert_product(&self, product: NewProduct) {
        let product: Product = product.into();
        self.lock().products.insert(product.id.clone(), product);
    }

    /// Overwrite a product's current price (simulates a catalog price change).
    ///
    /// Returns `false` if the product does not exist.
    pub fn set_price(&self, id: &ProductId, price: Decimal) -> bool {
        self.lock()
            .products
            .get_mut(id)
            .map(|p| p.price = price)
            .is_some()
    }

    /// Current inventory of a product, if it exists.
    #[must_use]
    pub fn inventory(&self, id: &ProductId) -> Option<i32> {
        self.lock().products.get(id).map(|p| p.inventory)
    }

    /// Number of user rows.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    /// Number of order rows.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every mutation under this lock is panic-free, so data behind a
        // poisoned guard is still consistent; recover instead of cascading
        // the panic into every later caller.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Inner {
    /// Expand a stored order into a composed view against the live catalog.
    fn view(&self, stored: &StoredOrder) -> Result<OrderView, RepositoryError> {
        let items = stored
            .items
            .iter()
            .map(|item| {
                let product = self.products.get(&item.product_id).cloned().ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "order line references unknown product {}",
                        item.product_id
                    ))
                })?;
                Ok(OrderLineView {
                    product,
                    quantity: item.quantity,
                    price_at_time: item.price_at_time,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        let order = &stored.order;
        Ok(OrderView {
            id: order.id,
            user_wallet: order.user_wallet.clone(),
            items,
            total_amount: order.total_amount,
            status: order.status,
            tx_hash: order.tx_hash.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }
}

#[async_trait]
impl SettlementStore for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let inner = self.lock();
        let mut products: Vec<Product> = inner
            .products
            .values()
            .filter(|p| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|category| &p.category == category)
                    && filter.featured.is_none_or(|featured| p.featured == featured)
            })
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.lock().products.get(id).cloned())
    }

    async fn reserve_inventory(
        &self,
        id: &ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.lock();
        match inner.products.get_mut(id) {
            Some(product) if product.inventory >= quantity => {
                product.inventory -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_user(&self, wallet: &WalletAddress) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock().users.get(wallet.as_str()).cloned())
    }

    async fn find_or_create_user(&self, wallet: &WalletAddress) -> Result<User, RepositoryError> {
        let mut inner = self.lock();
        let user = inner
            .users
            .entry(wallet.as_str().to_owned())
            .or_insert_with(|| User {
                id: UserId::generate(),
                wallet_address: wallet.clone(),
                email: None,
                created_at: Utc::now(),
            });
        Ok(user.clone())
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut inner = self.lock();

        if inner
            .orders
            .iter()
            .any(|stored| stored.order.tx_hash == order.tx_hash)
        {
            return Err(RepositoryError::Conflict(format!(
                "duplicate settlement: {}",
                order.tx_hash
            )));
        }

        let now = Utc::now();
        let created = Order {
            id: OrderId::generate(),
            user_id: order.user_id,
            user_wallet: order.user_wallet,
            total_amount: order.total_amount,
            status: order.status,
            tx_hash: order.tx_hash,
            created_at: now,
            updated_at: now,
        };

        inner.orders.push(StoredOrder {
            order: created.clone(),
            items: Vec::new(),
        });

        Ok(created)
    }

    async fn insert_order_items(
        &self,
        order_id: OrderId,
        items: &[NewOrderItem],
    ) -> Result<(), RepositoryError> {
        let mut inner = self.lock();
        let stored = inner
            .orders
            .iter_mut()
            .find(|stored| stored.order.id == order_id)
            .ok_or(RepositoryError::NotFound)?;
        stored.items.extend_from_slice(items);
        Ok(())
    }

    async fn order_by_tx_hash(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Option<OrderView>, RepositoryError> {
        let inner = self.lock();
        inner
            .orders
            .iter()
            .find(|stored| &stored.order.tx_hash == tx_hash)
            .map(|stored| inner.view(stored))
            .transpose()
    }

    async fn order_view(&self, id: OrderId) -> Result<OrderView, RepositoryError> {
        let inner = self.lock();
        let stored = inner
            .orders
            .iter()
            .find(|stored| stored.order.id == id)
            .ok_or(RepositoryError::NotFound)?;
        inner.view(stored)
    }

    async fn orders_by_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<OrderView>, RepositoryError> {
        let inner = self.lock();
        inner
            .orders
            .iter()
            .rev()
            .filter(|stored| &stored.order.user_wallet == wallet)
            .map(|stored| inner.view(stored))
            .collect()
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.lock();
        let stored = inner
            .orders
            .iter_mut()
            .find(|stored| stored.order.id == id)
            .ok_or(RepositoryError::NotFound)?;
        stored.order.status = status;
        stored.order.updated_at = Utc::now();
        Ok(())
    }

    async fn add_to_wishlist(
        &self,
        user_id: UserId,
        product_id: &ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.lock();
        let entries = inner.wishlists.entry(user_id).or_default();
        if entries.contains(product_id) {
            return Ok(false);
        }
        entries.push(product_id.clone());
        Ok(true)
    }

    async fn remove_from_wishlist(
        &self,
        user_id: UserId,
        product_id: &ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.lock();
        let Some(entries) = inner.wishlists.get_mut(&user_id) else {
            return Ok(false);
        };
        match entries.iter().position(|id| id == product_id) {
            Some(index) => {
                entries.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn wishlist(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let inner = self.lock();
        inner
            .wishlists
            .get(&user_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|product_id| {
                inner.products.get(product_id).cloned().ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "wishlist references unknown product {product_id}"
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_remains_usable_after_a_panic_under_the_lock() {
        let store = MemoryStore::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.inner.lock().expect("lock not yet poisoned");
            panic!("simulated panic while holding the lock");
        }));
        assert!(result.is_err());

        // The mutex is now poisoned; reads must still serve.
        assert_eq!(store.user_count(), 0);
        assert_eq!(store.order_count(), 0);
    }
}
