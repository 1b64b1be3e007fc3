use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{product, product_variant},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductsQuery {
    pub category: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(("category" = Option<String>, Query, description = "Filter by category")),
    responses((status = 200, description = "Active products, name ascending")),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> ApiResult<Vec<product::Model>> {
    let products = state.services.products.list_products(query.category).await?;
    Ok(Json(ApiResponse::success(products)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/variants",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Active variants of the product"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn list_product_variants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<product_variant::Model>> {
    let variants = state.services.products.list_variants(id).await?;
    Ok(Json(ApiResponse::success(variants)))
}
