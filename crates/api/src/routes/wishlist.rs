//! Wishlist handlers.
//!
//! Wishlists are server-side state keyed by user, so a wallet sees the same
//! saved products from any device. Mutations report whether a row actually
//! changed; re-adding a saved product is a no-op, not an error.

use axum::{Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};

use stablefront_core::{ProductId, WalletAddress};

use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::models::{Product, User};
use crate::state::AppState;

use super::ApiResponse;

/// Build the wishlist router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/wishlist", get(list).post(add).delete(remove))
}

/// Request body identifying one wishlist entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    /// Owning wallet address.
    pub wallet_address: String,
    /// Product SKU to save or remove.
    pub product_id: String,
}

/// Query parameters for listing a wishlist.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Wallet address to list saved products for.
    pub wallet_address: String,
}

/// Response payload for a wishlist read.
#[derive(Debug, Serialize)]
pub struct WishlistData {
    /// Saved products, oldest first.
    pub products: Vec<Product>,
}

/// Response payload for an add mutation.
#[derive(Debug, Serialize)]
pub struct AddedData {
    /// Whether the product was newly added.
    pub added: bool,
}

/// Response payload for a remove mutation.
#[derive(Debug, Serialize)]
pub struct RemovedData {
    /// Whether an entry was removed.
    pub removed: bool,
}

/// Save a product to the wallet's wishlist.
///
/// # Errors
///
/// Returns 400 for malformed addresses, 404 for unknown users or products,
/// and 500 for storage failures.
pub async fn add(
    State(state): State<AppState>,
    Json(entry): Json<WishlistEntry>,
) -> Result<Json<ApiResponse<AddedData>>, ApiError> {
    let user = resolve_user(&state, &entry.wallet_address).await?;

    let product_id = ProductId::new(entry.product_id);
    state
        .store()
        .product(&product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product not found: {product_id}")))?;

    let added = state.store().add_to_wishlist(user.id, &product_id).await?;

    Ok(Json(ApiResponse::ok(AddedData { added })))
}

/// Remove a product from the wallet's wishlist.
///
/// # Errors
///
/// Returns 400 for malformed addresses, 404 for unknown users, and 500 for
/// storage failures.
pub async fn remove(
    State(state): State<AppState>,
    Json(entry): Json<WishlistEntry>,
) -> Result<Json<ApiResponse<RemovedData>>, ApiError> {
    let user = resolve_user(&state, &entry.wallet_address).await?;

    let product_id = ProductId::new(entry.product_id);
    let removed = state
        .store()
        .remove_from_wishlist(user.id, &product_id)
        .await?;

    Ok(Json(ApiResponse::ok(RemovedData { removed })))
}

/// List the wallet's saved products, oldest first.
///
/// A wallet with no user row has saved nothing; that is an empty list, not
/// an error.
///
/// # Errors
///
/// Returns 400 for malformed addresses and 500 for storage failures.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<WishlistData>>, ApiError> {
    let wallet = parse_wallet(&params.wallet_address)?;

    let products = match state.store().find_user(&wallet).await? {
        Some(user) => state.store().wishlist(user.id).await?,
        None => Vec::new(),
    };

    Ok(Json(ApiResponse::ok(WishlistData { products })))
}

async fn resolve_user(state: &AppState, wallet: &str) -> Result<User, ApiError> {
    let wallet = parse_wallet(wallet)?;
    state
        .store()
        .find_user(&wallet)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))
}

fn parse_wallet(raw: &str) -> Result<WalletAddress, ApiError> {
    WalletAddress::parse(raw)
        .map_err(|e| ApiError::BadRequest(format!("valid wallet address is required: {e}")))
}
