//! Online payment tests: gateway order creation against a mock gateway,
//! signature verification, and the no-commit-without-verification property.

mod common;

use axum::http::{Method, StatusCode};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use common::{response_json, TestApp, TEST_GATEWAY_KEY_ID, TEST_GATEWAY_SECRET};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// The signature the real gateway would attach to a completed payment.
fn gateway_signature(order_id: &str, payment_id: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(TEST_GATEWAY_SECRET.as_bytes()).unwrap();
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn expected_basic_auth() -> String {
    format!(
        "Basic {}",
        BASE64.encode(format!("{TEST_GATEWAY_KEY_ID}:{TEST_GATEWAY_SECRET}"))
    )
}

/// Mounts the gateway's create-order endpoint, answering with a fixed
/// gateway order id and the echoed amount.
async fn mock_gateway(gateway_order_id: &str, amount_minor: i64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .and(header("authorization", expected_basic_auth().as_str()))
        .and(body_partial_json(json!({
            "amount": amount_minor,
            "currency": "INR",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": gateway_order_id,
            "amount": amount_minor,
            "currency": "INR",
            "status": "created",
        })))
        .mount(&server)
        .await;
    server
}

fn online_checkout_payload() -> Value {
    json!({
        "customer": { "type": "guest", "email": "asha@example.com" },
        "phone_number": "9876543210",
        "delivery_address": "12 Market Road, Jaipur",
        "delivery_pincode": "302001",
        "payment_method": "online",
        "lines": [{ "product_id": Uuid::new_v4(), "unit_price": "100", "quantity": 2 }],
    })
}

#[tokio::test]
async fn test_online_checkout_opens_gateway_order_in_minor_units() {
    let gateway = mock_gateway("order_wm_happy", 25_000).await;
    let app = TestApp::with_gateway(&gateway.uri()).await;
    app.seed_pincode("302001", None).await;

    let response = app
        .request(Method::POST, "/api/v1/checkout", Some(online_checkout_payload()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert!(body["checkout_id"].as_str().unwrap().starts_with("ckt_"));
    assert_eq!(body["gateway_order"]["id"], "order_wm_happy");
    assert_eq!(body["gateway_order"]["amount"], 25_000);
    assert_eq!(body["gateway_order"]["currency"], "INR");
    assert_eq!(body["key_id"], TEST_GATEWAY_KEY_ID);

    // Payment required, nothing committed yet.
    let orders = response_json(app.request(Method::GET, "/api/v1/orders", None).await).await;
    assert_eq!(orders["data"]["total"], 0);
}

#[tokio::test]
async fn test_double_submit_reuses_open_gateway_order() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_wm_dedup",
            "amount": 25_000,
            "currency": "INR",
            "status": "created",
        })))
        .expect(1)
        .mount(&gateway)
        .await;

    let app = TestApp::with_gateway(&gateway.uri()).await;
    app.seed_pincode("302001", None).await;

    // Same cart submitted twice in quick succession (a double-click): both
    // responses carry the same attempt, and the gateway saw one order.
    let payload = online_checkout_payload();
    let first = response_json(
        app.request(Method::POST, "/api/v1/checkout", Some(payload.clone()))
            .await,
    )
    .await;
    let second = response_json(
        app.request(Method::POST, "/api/v1/checkout", Some(payload))
            .await,
    )
    .await;

    assert_eq!(first["checkout_id"], second["checkout_id"]);
    assert_eq!(second["gateway_order"]["id"], "order_wm_dedup");
}

#[tokio::test]
async fn test_verified_payment_commits_confirmed_order() {
    let gateway = mock_gateway("order_wm_verify", 25_000).await;
    let app = TestApp::with_gateway(&gateway.uri()).await;
    app.seed_pincode("302001", None).await;

    let checkout = response_json(
        app.request(Method::POST, "/api/v1/checkout", Some(online_checkout_payload()))
            .await,
    )
    .await;
    let checkout_id = checkout["checkout_id"].as_str().unwrap();

    let verify = app
        .request(
            Method::POST,
            "/api/v1/payments/verify",
            Some(json!({
                "gateway_order_id": "order_wm_verify",
                "gateway_payment_id": "pay_wm_001",
                "gateway_signature": gateway_signature("order_wm_verify", "pay_wm_001"),
                "checkout_id": checkout_id,
            })),
        )
        .await;
    assert_eq!(verify.status(), StatusCode::OK);

    let body = response_json(verify).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["verified"], true);

    let order = &body["order"];
    assert_eq!(order["payment_status"], "completed");
    assert_eq!(order["status"], "confirmed");
    assert_eq!(order["payment_mode"], "prepaid");
    assert_eq!(order["total_amount"], "250");
    assert_eq!(order["gateway_order_id"], "order_wm_verify");
    assert_eq!(order["gateway_payment_id"], "pay_wm_001");

    // Header and items landed together.
    let order_id = order["id"].as_str().unwrap();
    let items = response_json(
        app.request(
            Method::GET,
            &format!("/api/v1/orders/{order_id}/items"),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(items["data"].as_array().unwrap().len(), 1);
    assert_eq!(items["data"][0]["total_price"], "200");
}

#[tokio::test]
async fn test_tampered_signature_commits_nothing() {
    let gateway = mock_gateway("order_wm_tamper", 25_000).await;
    let app = TestApp::with_gateway(&gateway.uri()).await;
    app.seed_pincode("302001", None).await;

    let checkout = response_json(
        app.request(Method::POST, "/api/v1/checkout", Some(online_checkout_payload()))
            .await,
    )
    .await;
    let checkout_id = checkout["checkout_id"].as_str().unwrap().to_string();

    // Flip the last hex character of an otherwise valid signature.
    let mut signature = gateway_signature("order_wm_tamper", "pay_wm_002");
    let last = signature.pop().unwrap();
    signature.push(if last == '0' { '1' } else { '0' });

    let verify = app
        .request(
            Method::POST,
            "/api/v1/payments/verify",
            Some(json!({
                "gateway_order_id": "order_wm_tamper",
                "gateway_payment_id": "pay_wm_002",
                "gateway_signature": signature,
                "checkout_id": checkout_id,
            })),
        )
        .await;
    assert_eq!(verify.status(), StatusCode::UNAUTHORIZED);

    let body = response_json(verify).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["verified"], false);
    assert!(body["order"].is_null());

    // No order row, no items.
    let orders = response_json(app.request(Method::GET, "/api/v1/orders", None).await).await;
    assert_eq!(orders["data"]["total"], 0);

    // The attempt survives a failed verification, so a fresh, genuine
    // confirmation for the same gateway order can still land.
    let retry = app
        .request(
            Method::POST,
            "/api/v1/payments/verify",
            Some(json!({
                "gateway_order_id": "order_wm_tamper",
                "gateway_payment_id": "pay_wm_003",
                "gateway_signature": gateway_signature("order_wm_tamper", "pay_wm_003"),
                "checkout_id": checkout_id,
            })),
        )
        .await;
    assert_eq!(retry.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_confirmation_for_wrong_gateway_order_rejected() {
    let gateway = mock_gateway("order_wm_right", 25_000).await;
    let app = TestApp::with_gateway(&gateway.uri()).await;
    app.seed_pincode("302001", None).await;

    let checkout = response_json(
        app.request(Method::POST, "/api/v1/checkout", Some(online_checkout_payload()))
            .await,
    )
    .await;
    let checkout_id = checkout["checkout_id"].as_str().unwrap();

    // Validly signed confirmation, but for a different gateway order than
    // the one this attempt opened.
    let verify = app
        .request(
            Method::POST,
            "/api/v1/payments/verify",
            Some(json!({
                "gateway_order_id": "order_wm_other",
                "gateway_payment_id": "pay_wm_004",
                "gateway_signature": gateway_signature("order_wm_other", "pay_wm_004"),
                "checkout_id": checkout_id,
            })),
        )
        .await;
    assert_eq!(verify.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_unknown_checkout_attempt_is_not_found() {
    let app = TestApp::new().await;

    let verify = app
        .request(
            Method::POST,
            "/api/v1/payments/verify",
            Some(json!({
                "gateway_order_id": "order_wm_none",
                "gateway_payment_id": "pay_wm_005",
                "gateway_signature": gateway_signature("order_wm_none", "pay_wm_005"),
                "checkout_id": "ckt_does_not_exist",
            })),
        )
        .await;
    assert_eq!(verify.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_payment_order_endpoint() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .and(body_partial_json(json!({
            "amount": 9_999,
            "currency": "INR",
            "receipt": "rcpt_direct_1",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_wm_direct",
            "amount": 9_999,
            "currency": "INR",
            "receipt": "rcpt_direct_1",
            "status": "created",
        })))
        .mount(&gateway)
        .await;

    let app = TestApp::with_gateway(&gateway.uri()).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/payments/orders",
            Some(json!({ "amount": "99.99", "currency": "INR", "receipt": "rcpt_direct_1" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["order"]["id"], "order_wm_direct");
    assert_eq!(body["order"]["amount"], 9_999);
}

#[tokio::test]
async fn test_gateway_rejection_surfaces_as_bad_gateway() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "internal error" })),
        )
        .mount(&gateway)
        .await;

    let app = TestApp::with_gateway(&gateway.uri()).await;
    app.seed_pincode("302001", None).await;

    let direct = app
        .request(
            Method::POST,
            "/api/v1/payments/orders",
            Some(json!({ "amount": "250", "currency": "INR", "receipt": "rcpt_fail_1" })),
        )
        .await;
    assert_eq!(direct.status(), StatusCode::BAD_GATEWAY);

    // The checkout path propagates the same failure and creates no state.
    let checkout = app
        .request(Method::POST, "/api/v1/checkout", Some(online_checkout_payload()))
        .await;
    assert_eq!(checkout.status(), StatusCode::BAD_GATEWAY);

    let orders = response_json(app.request(Method::GET, "/api/v1/orders", None).await).await;
    assert_eq!(orders["data"]["total"], 0);
}

#[tokio::test]
async fn test_non_positive_amount_rejected_before_gateway() {
    let gateway = MockServer::start().await;
    // No mock mounted: reaching the gateway would fail the test with a 502.
    let app = TestApp::with_gateway(&gateway.uri()).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/payments/orders",
            Some(json!({ "amount": "0", "currency": "INR", "receipt": "rcpt_zero" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
