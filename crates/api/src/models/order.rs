//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stablefront_core::{OrderId, OrderStatus, ProductId, TxHash, UserId, WalletAddress};

use super::Product;

/// An order record as persisted (without line expansion).
#[derive(Debug, Clone)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Wallet address, denormalized for the history query path.
    pub user_wallet: WalletAddress,
    /// Total amount at creation time; never recomputed afterwards.
    pub total_amount: Decimal,
    /// Current fulfillment status.
    pub status: OrderStatus,
    /// Settlement transaction hash (idempotency key).
    pub tx_hash: TxHash,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

/// An order line joined with a current product snapshot.
///
/// `price_at_time` and `quantity` are the authoritative historical values;
/// the embedded `product` reflects *current* catalog state (price, inventory,
/// display flags) and is for display only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    /// Current catalog snapshot of the purchased product.
    pub product: Product,
    /// Quantity purchased.
    pub quantity: i32,
    /// Unit price captured when the order was created.
    pub price_at_time: Decimal,
}

/// A composed order as returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    /// Unique order ID.
    pub id: OrderId,
    /// Wallet address that paid for the order.
    pub user_wallet: WalletAddress,
    /// Expanded line items.
    pub items: Vec<OrderLineView>,
    /// Total amount at creation time.
    pub total_amount: Decimal,
    /// Current fulfillment status.
    pub status: OrderStatus,
    /// Settlement transaction hash.
    pub tx_hash: TxHash,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating an order shell.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Owning user.
    pub user_id: UserId,
    /// Paying wallet (denormalized onto the order row).
    pub user_wallet: WalletAddress,
    /// Total amount, computed from captured line prices.
    pub total_amount: Decimal,
    /// Initial status.
    pub status: OrderStatus,
    /// Settlement transaction hash.
    pub tx_hash: TxHash,
}

/// Parameters for one order line.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    /// Purchased product.
    pub product_id: ProductId,
    /// Quantity purchased.
    pub quantity: i32,
    /// Unit price captured at settlement time.
    pub price_at_time: Decimal,
}
