use axum::Json;
use utoipa::OpenApi;

/// OpenAPI document for the storefront API, served as JSON at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "kirana-api",
        description = "Grocery-delivery storefront backend: serviceability, checkout, payments, orders, and catalog reads"
    ),
    paths(
        crate::handlers::serviceability::check_pincode,
        crate::handlers::checkout::place_order,
        crate::handlers::payments::create_payment_order,
        crate::handlers::payments::verify_payment,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::get_order_items,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::cancel_order,
        crate::handlers::products::list_products,
        crate::handlers::products::list_product_variants,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::models::cart::CartLine,
        crate::models::cart::CheckoutCustomer,
        crate::models::order::OrderStatus,
        crate::models::order::PaymentMethod,
        crate::services::checkout::PlaceOrderRequest,
        crate::services::checkout::OnlineCheckout,
        crate::services::orders::OrderResponse,
        crate::services::orders::OrderItemResponse,
        crate::services::orders::OrderListResponse,
        crate::services::payments::collector::PaymentConfirmation,
        crate::services::payments::gateway::GatewayOrder,
        crate::services::serviceability::ServiceabilityStatus,
        crate::handlers::payments::CreatePaymentOrderRequest,
        crate::handlers::payments::CreatePaymentOrderResponse,
        crate::handlers::payments::VerifyPaymentRequest,
        crate::handlers::payments::VerifyPaymentResponse,
        crate::handlers::orders::UpdateOrderStatusRequest,
    )),
    tags(
        (name = "Serviceability", description = "Delivery-area checks"),
        (name = "Checkout", description = "Cart to order"),
        (name = "Payments", description = "Payment gateway integration"),
        (name = "Orders", description = "Order history and admin transitions"),
        (name = "Products", description = "Catalog reads")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
