//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stablefront_core::{UserId, WalletAddress};

/// A storefront user, identified by wallet address.
///
/// Created lazily on first settlement or wallet sign-in; never deleted.
/// The only mutation the schema allows is an email backfill.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Wallet address exactly as first supplied (no checksum normalization).
    pub wallet_address: WalletAddress,
    /// Optional contact email.
    pub email: Option<String>,
    /// When the user was first seen.
    pub created_at: DateTime<Utc>,
}
