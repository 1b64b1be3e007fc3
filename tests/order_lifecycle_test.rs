//! Order status machine tests driven through the admin surface: the
//! forward-only chain, cancellation, and rejection of illegal transitions.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

async fn place_cod_order(app: &TestApp) -> String {
    app.seed_pincode("302001", None).await;

    let payload = json!({
        "customer": { "type": "guest", "email": "asha@example.com" },
        "phone_number": "9876543210",
        "delivery_address": "12 Market Road, Jaipur",
        "delivery_pincode": "302001",
        "payment_method": "cod",
        "lines": [{ "product_id": Uuid::new_v4(), "unit_price": "80", "quantity": 1 }],
    });

    let response = app.request(Method::POST, "/api/v1/checkout", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["id"]
        .as_str()
        .expect("order id")
        .to_string()
}

async fn set_status(app: &TestApp, order_id: &str, status: &str) -> (StatusCode, Value) {
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/status"),
            Some(json!({ "status": status })),
        )
        .await;
    let status_code = response.status();
    (status_code, response_json(response).await)
}

#[tokio::test]
async fn test_full_forward_chain_to_delivered() {
    let app = TestApp::new().await;
    let order_id = place_cod_order(&app).await;

    for next in ["confirmed", "preparing", "out_for_delivery", "delivered"] {
        let (code, body) = set_status(&app, &order_id, next).await;
        assert_eq!(code, StatusCode::OK, "transition to {next}");
        assert_eq!(body["data"]["status"], next);
    }
}

#[tokio::test]
async fn test_skipping_a_stage_is_rejected() {
    let app = TestApp::new().await;
    let order_id = place_cod_order(&app).await;

    // pending → preparing skips confirmation.
    let (code, _) = set_status(&app, &order_id, "preparing").await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    // The order is untouched.
    let order = response_json(
        app.request(Method::GET, &format!("/api/v1/orders/{order_id}"), None)
            .await,
    )
    .await;
    assert_eq!(order["data"]["status"], "pending");
}

#[tokio::test]
async fn test_status_never_moves_backward() {
    let app = TestApp::new().await;
    let order_id = place_cod_order(&app).await;

    let (code, _) = set_status(&app, &order_id, "confirmed").await;
    assert_eq!(code, StatusCode::OK);

    let (code, _) = set_status(&app, &order_id, "pending").await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_from_non_terminal_state() {
    let app = TestApp::new().await;
    let order_id = place_cod_order(&app).await;

    set_status(&app, &order_id, "confirmed").await;
    set_status(&app, &order_id, "preparing").await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{order_id}/cancel"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "cancelled");

    // Cancelled is terminal.
    let again = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{order_id}/cancel"),
            None,
        )
        .await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delivered_order_cannot_be_cancelled() {
    let app = TestApp::new().await;
    let order_id = place_cod_order(&app).await;

    for next in ["confirmed", "preparing", "out_for_delivery", "delivered"] {
        set_status(&app, &order_id, next).await;
    }

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{order_id}/cancel"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (code, _) = set_status(&app, &Uuid::new_v4().to_string(), "confirmed").await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_orders_list_newest_first() {
    let app = TestApp::new().await;
    let first = place_cod_order(&app).await;
    let payload = json!({
        "customer": { "type": "guest", "email": "ravi@example.com" },
        "phone_number": "9876501234",
        "delivery_address": "7 Temple Street, Jaipur",
        "delivery_pincode": "302001",
        "payment_method": "cod",
        "lines": [{ "product_id": Uuid::new_v4(), "unit_price": "25", "quantity": 4 }],
    });
    let second = response_json(app.request(Method::POST, "/api/v1/checkout", Some(payload)).await)
        .await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let list = response_json(app.request(Method::GET, "/api/v1/orders", None).await).await;
    assert_eq!(list["data"]["total"], 2);
    assert_eq!(list["data"]["orders"][0]["id"], second);
    assert_eq!(list["data"]["orders"][1]["id"], first);
}
