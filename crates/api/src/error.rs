//! Unified error handling with Sentry integration.
//!
//! Provides a unified `ApiError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, ApiError>`; nothing but the `{success, error}` envelope crosses
//! the HTTP boundary.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::routes::ApiResponse;
use crate::services::SettlementError;

/// Application-level error type for the settlement API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client sent a structurally or semantically invalid request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Settlement failed after the payment record was persisted; the order
    /// is retained for manual reconciliation.
    #[error("reconciliation required: {0}")]
    Reconciliation(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SettlementError> for ApiError {
    fn from(err: SettlementError) -> Self {
        match err {
            e if e.is_validation() => Self::BadRequest(e.to_string()),
            SettlementError::InventoryRace { .. } => Self::Reconciliation(err.to_string()),
            SettlementError::Store(e) => Self::Database(e),
            e => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Reconciliation(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Reconciliation(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Don't expose storage internals to clients; reconciliation errors
        // keep their message so support can act on the order/tx references.
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::BadRequest(msg) | Self::NotFound(msg) | Self::Reconciliation(msg) => msg.clone(),
        };

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use stablefront_core::WalletAddressError;

    fn get_status(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn status_codes_follow_the_contract() {
        assert_eq!(
            get_status(ApiError::BadRequest("empty cart".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ApiError::NotFound("user".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ApiError::Database(RepositoryError::NotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(ApiError::Reconciliation("order o1".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn settlement_validation_maps_to_bad_request() {
        let err: ApiError = SettlementError::EmptyCart.into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = SettlementError::InvalidWallet(WalletAddressError::Empty).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn settlement_store_failure_maps_to_database() {
        let err: ApiError = SettlementError::Store(RepositoryError::NotFound).into();
        assert!(matches!(err, ApiError::Database(_)));
    }
}
