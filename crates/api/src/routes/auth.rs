//! Wallet sign-in handlers.
//!
//! There are no sessions or passwords: presenting a wallet address is the
//! whole sign-in, and the user row is created on first sight. Signature
//! verification is the wallet connector's concern, out of scope here.

use axum::{Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use stablefront_core::WalletAddress;

use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::models::User;
use crate::state::AppState;

use super::ApiResponse;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/auth", post(sign_in).get(lookup))
}

/// Request body for wallet sign-in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    /// Wallet address presented by the client.
    pub wallet_address: String,
}

/// Query parameters for user lookup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupParams {
    /// Wallet address to look up.
    pub wallet_address: String,
}

/// Response payload carrying a user.
#[derive(Debug, Serialize)]
pub struct UserData {
    /// The user.
    pub user: User,
}

/// Sign in with a wallet address, creating the user on first sight.
///
/// # Errors
///
/// Returns 400 for malformed addresses and 500 for storage failures.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let wallet = WalletAddress::parse(&request.wallet_address)
        .map_err(|e| ApiError::BadRequest(format!("valid wallet address is required: {e}")))?;

    let user = state.store().find_or_create_user(&wallet).await?;

    Ok(Json(ApiResponse::ok(UserData { user })))
}

/// Look up an existing user by wallet address.
///
/// # Errors
///
/// Returns 404 if no user exists for the address.
pub async fn lookup(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let wallet = WalletAddress::parse(&params.wallet_address)
        .map_err(|e| ApiError::BadRequest(format!("valid wallet address is required: {e}")))?;

    let user = state
        .store()
        .find_user(&wallet)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    Ok(Json(ApiResponse::ok(UserData { user })))
}
