//! Catalog read handlers.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use stablefront_core::ProductId;

use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::models::{Product, ProductFilter};
use crate::state::AppState;

use super::ApiResponse;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list))
        .route("/api/products/{id}", get(detail))
}

/// Query parameters for catalog listing.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Only products in this category.
    pub category: Option<String>,
    /// Only products with this featured flag.
    pub featured: Option<bool>,
}

/// Response payload for catalog listing.
#[derive(Debug, Serialize)]
pub struct ProductsData {
    /// Matching products.
    pub products: Vec<Product>,
}

/// Response payload for a single product.
#[derive(Debug, Serialize)]
pub struct ProductData {
    /// The product.
    pub product: Product,
}

/// List catalog products, optionally filtered by category/featured.
///
/// # Errors
///
/// Returns an error if the catalog read fails.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<ProductsData>>, ApiError> {
    let filter = ProductFilter {
        category: params.category,
        featured: params.featured,
    };
    let products = state.store().list_products(&filter).await?;

    Ok(Json(ApiResponse::ok(ProductsData { products })))
}

/// Look up one product by SKU.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductData>>, ApiError> {
    let id = ProductId::new(id);
    let product = state
        .store()
        .product(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product not found: {id}")))?;

    Ok(Json(ApiResponse::ok(ProductData { product })))
}
