use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    errors::ServiceError,
    services::checkout::{CheckoutOutcome, OnlineCheckout, PlaceOrderRequest},
    services::orders::OrderResponse,
    AppState,
};

/// Runs checkout for a submitted cart. COD orders commit immediately and
/// return 201; online payments return 200 with the gateway order handle the
/// client needs to open the hosted payment UI.
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "COD order committed", body = OrderResponse),
        (status = 200, description = "Online payment required", body = OnlineCheckout),
        (status = 422, description = "Pincode not serviceable", body = crate::errors::ErrorResponse),
        (status = 400, description = "Invalid checkout request", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn place_order(
    State(state): State<AppState>,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<Response, ServiceError> {
    match state.services.checkout.place_order(payload).await? {
        CheckoutOutcome::Placed(order) => {
            Ok((StatusCode::CREATED, Json(OrderResponse::from(order))).into_response())
        }
        CheckoutOutcome::PaymentRequired(online) => {
            Ok((StatusCode::OK, Json(online)).into_response())
        }
    }
}
