//! Serviceability endpoint tests, including the fail-closed behavior on
//! lookup errors.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

#[tokio::test]
async fn test_known_pincode_is_serviceable_with_area_fee() {
    let app = TestApp::new().await;
    app.seed_pincode("302001", Some(dec!(35))).await;

    let response = app
        .request(Method::GET, "/api/v1/serviceability/302001", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["serviceable"], true);
    assert_eq!(body["delivery_fee"], "35");
}

#[tokio::test]
async fn test_area_without_own_fee_uses_default() {
    let app = TestApp::new().await;
    app.seed_pincode("302002", None).await;

    let body = response_json(
        app.request(Method::GET, "/api/v1/serviceability/302002", None)
            .await,
    )
    .await;
    assert_eq!(body["serviceable"], true);
    assert_eq!(body["delivery_fee"], "50");
}

#[tokio::test]
async fn test_unknown_pincode_is_not_serviceable() {
    let app = TestApp::new().await;

    let body = response_json(
        app.request(Method::GET, "/api/v1/serviceability/999999", None)
            .await,
    )
    .await;
    assert_eq!(body["serviceable"], false);
    assert!(body.get("delivery_fee").is_none());
}

#[tokio::test]
async fn test_deactivated_pincode_is_not_serviceable() {
    let app = TestApp::new().await;
    app.seed_inactive_pincode("302003").await;

    let body = response_json(
        app.request(Method::GET, "/api/v1/serviceability/302003", None)
            .await,
    )
    .await;
    assert_eq!(body["serviceable"], false);
}

#[tokio::test]
async fn test_lookup_failure_fails_closed() {
    let app = TestApp::new().await;
    app.seed_pincode("302004", None).await;

    // Break the lookup underneath the service.
    app.state
        .db
        .execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            "DROP TABLE serviceable_pincodes;".to_string(),
        ))
        .await
        .expect("failed to drop table");

    // A previously serviceable pincode now reports not serviceable, as a
    // normal 200 response rather than an error.
    let response = app
        .request(Method::GET, "/api/v1/serviceability/302004", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["serviceable"], false);
}
