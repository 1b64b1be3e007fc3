//! kirana-api
//!
//! Backend for a grocery-delivery storefront. The heart of the crate is the
//! checkout payment-order lifecycle: serviceability check, order totals,
//! gateway order creation, HMAC signature verification, and the atomic
//! order commit.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrapper for the read surfaces
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// All `/api/v1` routes.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Serviceability
        .route(
            "/serviceability/{pincode}",
            get(handlers::serviceability::check_pincode),
        )
        // Checkout
        .route("/checkout", post(handlers::checkout::place_order))
        // Payments
        .route(
            "/payments/orders",
            post(handlers::payments::create_payment_order),
        )
        .route(
            "/payments/verify",
            post(handlers::payments::verify_payment),
        )
        // Orders
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders/{id}", get(handlers::orders::get_order))
        .route("/orders/{id}/items", get(handlers::orders::get_order_items))
        .route(
            "/orders/{id}/status",
            put(handlers::orders::update_order_status),
        )
        .route("/orders/{id}/cancel", post(handlers::orders::cancel_order))
        // Catalog
        .route("/products", get(handlers::products::list_products))
        .route(
            "/products/{id}/variants",
            get(handlers::products::list_product_variants),
        )
}

/// Full application router. Transport-level layers (CORS, compression) are
/// applied by the binary.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "kirana-api up" }))
        .nest("/api/v1", api_v1_routes())
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn api_status() -> Json<ApiResponse<Value>> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "kirana-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    Json(ApiResponse::success(status_data))
}

async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    Json(ApiResponse::success(health_data))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn test_success_response_shape() {
        let response = ApiResponse::success(42);
        assert!(response.success);
        assert_eq!(response.data, Some(42));
        assert!(response.message.is_none());
    }

    #[test]
    fn test_error_response_shape() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("oops"));
    }
}
