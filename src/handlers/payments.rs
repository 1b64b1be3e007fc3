use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    errors::ServiceError,
    services::orders::OrderResponse,
    services::payments::{GatewayOrder, PaymentConfirmation},
    AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePaymentOrderRequest {
    /// Amount in the store's base currency unit (e.g. rupees, not paise).
    pub amount: Decimal,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
    #[validate(length(min = 1, max = 40, message = "receipt must be 1-40 characters"))]
    pub receipt: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePaymentOrderResponse {
    pub order: GatewayOrder,
}

/// Opens an order with the payment gateway for the given amount.
#[utoipa::path(
    post,
    path = "/api/v1/payments/orders",
    request_body = CreatePaymentOrderRequest,
    responses(
        (status = 200, description = "Gateway order created", body = CreatePaymentOrderResponse),
        (status = 400, description = "Invalid amount", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway rejected the order", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn create_payment_order(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentOrderRequest>,
) -> Result<Json<CreatePaymentOrderResponse>, ServiceError> {
    payload.validate()?;

    let order = state
        .services
        .gateway
        .create_order(payload.amount, &payload.currency, &payload.receipt)
        .await?;

    Ok(Json(CreatePaymentOrderResponse { order }))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1))]
    pub gateway_order_id: String,
    #[validate(length(min = 1))]
    pub gateway_payment_id: String,
    #[validate(length(min = 1))]
    pub gateway_signature: String,
    /// The checkout attempt the confirmation belongs to.
    #[validate(length(min = 1))]
    pub checkout_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderResponse>,
}

/// Verifies a payment confirmation. On an exact signature match the pending
/// checkout is committed as paid and confirmed; on a mismatch nothing is
/// written and the response carries `verified: false`.
#[utoipa::path(
    post,
    path = "/api/v1/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified and order committed", body = VerifyPaymentResponse),
        (status = 401, description = "Signature mismatch", body = VerifyPaymentResponse),
        (status = 404, description = "Unknown checkout attempt", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Response, ServiceError> {
    payload.validate()?;

    let confirmation = PaymentConfirmation {
        gateway_order_id: payload.gateway_order_id,
        gateway_payment_id: payload.gateway_payment_id,
        gateway_signature: payload.gateway_signature,
    };

    match state
        .services
        .checkout
        .confirm_payment(&payload.checkout_id, confirmation)
        .await
    {
        Ok(order) => Ok((
            StatusCode::OK,
            Json(VerifyPaymentResponse {
                success: true,
                verified: true,
                order: Some(OrderResponse::from(order)),
            }),
        )
            .into_response()),
        Err(ServiceError::SignatureMismatch) => Ok((
            StatusCode::UNAUTHORIZED,
            Json(VerifyPaymentResponse {
                success: false,
                verified: false,
                order: None,
            }),
        )
            .into_response()),
        Err(other) => Err(other),
    }
}
