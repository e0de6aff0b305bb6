//! Payment settlement coordinator.
//!
//! Converts a confirmed on-chain stablecoin payment into a persisted order
//! plus inventory decrement. The caller (storefront client) has already
//! submitted the token transfer and observed finality; this service only ever
//! sees the resulting transaction hash, which doubles as the idempotency key.
//!
//! # Protocol
//!
//! 1. Structural validation - rejected requests touch no store.
//! 2. Idempotency lookup - a replayed transaction hash returns the existing
//!    order without re-running anything.
//! 3. Feasibility pre-check - advisory read of products and inventory for a
//!    clean early rejection; also verifies the declared total against current
//!    catalog prices.
//! 4. User resolution - find-or-create by wallet.
//! 5. Order shell creation - the transaction hash is durably recorded
//!    *before* inventory moves, so a later failure can never lose the
//!    payment record.
//! 6. Line materialization + per-line atomic reserve - the authoritative
//!    inventory step. A reserve failure here is recorded-fatal: the order
//!    stays, the error carries enough context for manual reconciliation.
//! 7. Response assembly - re-read of the composed order.

use rust_decimal::Decimal;
use serde::Deserialize;

use stablefront_core::{
    OrderId, OrderStatus, ProductId, TxHash, TxHashError, WalletAddress, WalletAddressError,
    to_base_units,
};

use crate::db::{RepositoryError, SettlementStore};
use crate::models::{NewOrder, NewOrderItem, OrderView};

/// One requested cart line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product SKU.
    pub product_id: String,
    /// Requested quantity.
    pub quantity: i32,
}

/// A settlement request as reported by the client after the on-chain
/// transfer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRequest {
    /// Cart contents; transformed into order lines at settlement.
    pub cart_items: Vec<CartLine>,
    /// Client-declared total, verified against current catalog prices.
    pub total_amount: Decimal,
    /// Paying wallet address.
    pub user_wallet: String,
    /// Hash of the confirmed token transfer.
    pub tx_hash: String,
}

/// Result of a successful settlement.
#[derive(Debug, Clone)]
pub struct SettledOrder {
    /// The composed order.
    pub order: OrderView,
    /// Whether this was an idempotent replay of an earlier settlement.
    pub replayed: bool,
}

/// Errors from the settlement protocol.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    /// The cart is empty.
    #[error("cart items are required")]
    EmptyCart,

    /// A cart line has a non-positive quantity.
    #[error("quantity must be positive for product {0}")]
    InvalidQuantity(String),

    /// The declared total is missing, non-positive, or not expressible in
    /// token base units.
    #[error("valid total amount is required")]
    InvalidTotal,

    /// The wallet address fails format validation.
    #[error("valid wallet address is required: {0}")]
    InvalidWallet(#[from] WalletAddressError),

    /// The transaction hash fails format validation.
    #[error("valid transaction hash is required: {0}")]
    InvalidTxHash(#[from] TxHashError),

    /// A cart line references a product the catalog does not have.
    #[error("product not found: {0}")]
    UnknownProduct(String),

    /// Advisory pre-check found too little inventory.
    #[error("insufficient inventory for {name}: available {available}, requested {requested}")]
    InsufficientInventory {
        /// Product display name.
        name: String,
        /// Units available at pre-check time.
        available: i32,
        /// Units requested.
        requested: i32,
    },

    /// The declared total disagrees with current catalog prices.
    #[error("total amount {declared} does not match cart total {computed}")]
    TotalMismatch {
        /// Client-declared total.
        declared: Decimal,
        /// Total computed from current catalog prices.
        computed: Decimal,
    },

    /// The atomic reserve failed after the order shell was recorded.
    ///
    /// The on-chain payment cannot be un-received, so the order is retained
    /// with its transaction hash for manual reconciliation rather than
    /// rolled back.
    #[error(
        "inventory reservation failed after payment was recorded: \
         order {order_id}, tx {tx_hash}, product {product_id}"
    )]
    InventoryRace {
        /// The already-persisted order.
        order_id: OrderId,
        /// The settlement transaction hash.
        tx_hash: TxHash,
        /// The line that failed to reserve.
        product_id: ProductId,
    },

    /// Unexpected storage failure.
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

impl SettlementError {
    /// Whether this error was raised before any store mutation.
    ///
    /// Validation failures are fully recoverable; the caller may resubmit.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyCart
                | Self::InvalidQuantity(_)
                | Self::InvalidTotal
                | Self::InvalidWallet(_)
                | Self::InvalidTxHash(_)
                | Self::UnknownProduct(_)
                | Self::InsufficientInventory { .. }
                | Self::TotalMismatch { .. }
        )
    }
}

/// A structurally valid settlement request.
struct ValidRequest {
    cart: Vec<(ProductId, i32)>,
    total: Decimal,
    wallet: WalletAddress,
    tx_hash: TxHash,
}

/// The settlement coordinator.
pub struct SettlementService<'a> {
    store: &'a dyn SettlementStore,
}

impl<'a> SettlementService<'a> {
    /// Create a coordinator over a storage backend.
    #[must_use]
    pub const fn new(store: &'a dyn SettlementStore) -> Self {
        Self { store }
    }

    /// Settle a payment: validate, reserve inventory, and persist the order.
    ///
    /// Idempotent by transaction hash: resubmitting a settled payment returns
    /// the existing order with `replayed = true` and decrements nothing.
    ///
    /// # Errors
    ///
    /// See [`SettlementError`]. Validation errors leave no trace; an
    /// [`SettlementError::InventoryRace`] leaves the order shell persisted on
    /// purpose.
    pub async fn settle(&self, request: SettlementRequest) -> Result<SettledOrder, SettlementError> {
        // Step 1: structural validation, before touching any store.
        let request = validate(request)?;

        // Step 2: idempotent replay detection. Runs before the feasibility
        // check so a retry of a completed settlement succeeds even if the
        // catalog has since sold out.
        if let Some(existing) = self.store.order_by_tx_hash(&request.tx_hash).await? {
            tracing::info!(
                order_id = %existing.id,
                tx_hash = %request.tx_hash,
                "settlement replayed, returning existing order"
            );
            return Ok(SettledOrder {
                order: existing,
                replayed: true,
            });
        }

        // Step 3: advisory feasibility pre-check and total verification.
        // The authoritative inventory enforcement is the atomic reserve in
        // step 6; this pass exists for a clean rejection with no side
        // effects.
        let mut computed_total = Decimal::ZERO;
        let mut lines = Vec::with_capacity(request.cart.len());
        for (product_id, quantity) in &request.cart {
            let product = self
                .store
                .product(product_id)
                .await?
                .ok_or_else(|| SettlementError::UnknownProduct(product_id.to_string()))?;

            if product.inventory < *quantity {
                return Err(SettlementError::InsufficientInventory {
                    name: product.name,
                    available: product.inventory,
                    requested: *quantity,
                });
            }

            computed_total += product.price * Decimal::from(*quantity);
            lines.push(NewOrderItem {
                product_id: product_id.clone(),
                quantity: *quantity,
                price_at_time: product.price,
            });
        }

        if computed_total != request.total {
            return Err(SettlementError::TotalMismatch {
                declared: request.total,
                computed: computed_total,
            });
        }

        // Step 4: user resolution.
        let user = self.store.find_or_create_user(&request.wallet).await?;

        // Step 5: order shell. The transaction hash is recorded before any
        // inventory moves; losing the payment record is worse than an
        // inventory mismatch.
        let order = match self
            .store
            .create_order(NewOrder {
                user_id: user.id,
                user_wallet: request.wallet.clone(),
                total_amount: computed_total,
                status: OrderStatus::Confirmed,
                tx_hash: request.tx_hash.clone(),
            })
            .await
        {
            Ok(order) => order,
            // Lost a same-tx-hash race against a concurrent settlement;
            // return the winner's order.
            Err(RepositoryError::Conflict(_)) => {
                let existing = self
                    .store
                    .order_by_tx_hash(&request.tx_hash)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                tracing::info!(
                    order_id = %existing.id,
                    tx_hash = %request.tx_hash,
                    "concurrent duplicate settlement, returning existing order"
                );
                return Ok(SettledOrder {
                    order: existing,
                    replayed: true,
                });
            }
            Err(e) => return Err(e.into()),
        };

        // Step 6: captured lines, then the authoritative atomic reserve.
        self.store.insert_order_items(order.id, &lines).await?;

        for line in &lines {
            let reserved = self
                .store
                .reserve_inventory(&line.product_id, line.quantity)
                .await?;

            if !reserved {
                // Inventory changed between the pre-check and now. The order
                // and its transaction hash are already durable; surface the
                // mismatch loudly instead of losing it.
                tracing::error!(
                    order_id = %order.id,
                    tx_hash = %request.tx_hash,
                    product_id = %line.product_id,
                    quantity = line.quantity,
                    "inventory reservation failed after order was recorded; \
                     manual reconciliation required"
                );
                return Err(SettlementError::InventoryRace {
                    order_id: order.id,
                    tx_hash: request.tx_hash,
                    product_id: line.product_id.clone(),
                });
            }
        }

        // Step 7: response assembly.
        let view = self.store.order_view(order.id).await?;
        Ok(SettledOrder {
            order: view,
            replayed: false,
        })
    }
}

/// Read path: order history for a wallet.
pub struct SettlementQuery<'a> {
    store: &'a dyn SettlementStore,
}

impl<'a> SettlementQuery<'a> {
    /// Create a query service over a storage backend.
    #[must_use]
    pub const fn new(store: &'a dyn SettlementStore) -> Self {
        Self { store }
    }

    /// All orders for a wallet, newest first, with expanded product
    /// snapshots. Embedded product fields reflect current catalog state;
    /// captured price/quantity on each line stay authoritative.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed wallet addresses and a store
    /// error for storage failures.
    pub async fn history(&self, wallet: &str) -> Result<Vec<OrderView>, SettlementError> {
        let wallet = WalletAddress::parse(wallet)?;
        Ok(self.store.orders_by_wallet(&wallet).await?)
    }
}

fn validate(request: SettlementRequest) -> Result<ValidRequest, SettlementError> {
    if request.cart_items.is_empty() {
        return Err(SettlementError::EmptyCart);
    }

    let mut cart = Vec::with_capacity(request.cart_items.len());
    for line in &request.cart_items {
        if line.quantity <= 0 {
            return Err(SettlementError::InvalidQuantity(line.product_id.clone()));
        }
        cart.push((ProductId::new(line.product_id.clone()), line.quantity));
    }

    // The total must be positive and expressible in USDC base units, since
    // that is exactly what the client transferred on-chain.
    if request.total_amount <= Decimal::ZERO || to_base_units(request.total_amount).is_err() {
        return Err(SettlementError::InvalidTotal);
    }

    let wallet = WalletAddress::parse(&request.user_wallet)?;
    let tx_hash = TxHash::parse(&request.tx_hash)?;

    Ok(ValidRequest {
        cart,
        total: request.total_amount,
        wallet,
        tx_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SettlementRequest {
        SettlementRequest {
            cart_items: vec![CartLine {
                product_id: "p1".into(),
                quantity: 2,
            }],
            total_amount: Decimal::from(20),
            user_wallet: "0x742d35Cc6634C0532925a3b844Bc454e4438f44e".into(),
            tx_hash: format!("0x{}", "1".repeat(64)),
        }
    }

    #[test]
    fn accepts_well_formed_request() {
        assert!(validate(request()).is_ok());
    }

    #[test]
    fn rejects_empty_cart() {
        let mut req = request();
        req.cart_items.clear();
        assert!(matches!(validate(req), Err(SettlementError::EmptyCart)));
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let mut req = request();
        req.cart_items[0].quantity = 0;
        assert!(matches!(
            validate(req),
            Err(SettlementError::InvalidQuantity(id)) if id == "p1"
        ));
    }

    #[test]
    fn rejects_non_positive_total() {
        let mut req = request();
        req.total_amount = Decimal::ZERO;
        assert!(matches!(validate(req), Err(SettlementError::InvalidTotal)));
    }

    #[test]
    fn rejects_sub_micro_total() {
        let mut req = request();
        req.total_amount = "0.0000001".parse().expect("valid decimal");
        assert!(matches!(validate(req), Err(SettlementError::InvalidTotal)));
    }

    #[test]
    fn rejects_malformed_wallet() {
        let mut req = request();
        req.user_wallet = "not-a-wallet".into();
        assert!(matches!(
            validate(req),
            Err(SettlementError::InvalidWallet(_))
        ));
    }

    #[test]
    fn rejects_malformed_tx_hash() {
        let mut req = request();
        req.tx_hash = "0x123".into();
        assert!(matches!(
            validate(req),
            Err(SettlementError::InvalidTxHash(_))
        ));
    }

    #[test]
    fn validation_errors_are_flagged_as_validation() {
        assert!(SettlementError::EmptyCart.is_validation());
        assert!(SettlementError::InvalidTotal.is_validation());
        assert!(
            !SettlementError::Store(RepositoryError::NotFound).is_validation()
        );
    }
}
