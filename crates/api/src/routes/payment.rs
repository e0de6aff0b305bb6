//! Payment settlement and order history handlers.

use axum::{Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::models::OrderView;
use crate::services::{SettlementQuery, SettlementRequest, SettlementService};
use crate::state::AppState;

use super::ApiResponse;

/// Build the payment router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/payment", post(settle).get(history))
}

/// Response payload for a settled payment.
#[derive(Debug, Serialize)]
pub struct OrderData {
    /// The composed order.
    pub order: OrderView,
}

/// Response payload for an order history query.
#[derive(Debug, Serialize)]
pub struct OrdersData {
    /// Orders, newest first.
    pub orders: Vec<OrderView>,
}

/// Query parameters for the history endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    /// Wallet address to list orders for.
    pub wallet_address: String,
}

/// Settle a confirmed on-chain payment.
///
/// Returns 200 with the composed order for both first-time settlement and
/// idempotent replay, 400 for validation/feasibility failures, 500 for
/// storage failures and the recorded-fatal inventory race.
///
/// # Errors
///
/// Returns an error if validation fails or a ledger operation fails.
pub async fn settle(
    State(state): State<AppState>,
    Json(request): Json<SettlementRequest>,
) -> Result<Json<ApiResponse<OrderData>>, ApiError> {
    let service = SettlementService::new(state.store());
    let settled = service.settle(request).await?;

    Ok(Json(ApiResponse::ok(OrderData {
        order: settled.order,
    })))
}

/// Fetch a wallet's order history, newest first.
///
/// # Errors
///
/// Returns an error if the wallet address is malformed or a ledger read
/// fails.
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ApiResponse<OrdersData>>, ApiError> {
    let query = SettlementQuery::new(state.store());
    let orders = query.history(&params.wallet_address).await?;

    Ok(Json(ApiResponse::ok(OrdersData { orders })))
}
