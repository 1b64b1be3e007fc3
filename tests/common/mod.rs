#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header::CONTENT_TYPE, Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use kirana_api::{
    config::AppConfig,
    db,
    entities::{product, product_variant, serviceable_area},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};

/// Key pair the test gateway is "configured" with. The secret doubles as the
/// HMAC key when tests forge or verify payment signatures.
pub const TEST_GATEWAY_KEY_ID: &str = "rzp_test_key_id";
pub const TEST_GATEWAY_SECRET: &str = "rzp_test_key_secret";

/// Helper harness for spinning up an application backed by a throwaway
/// SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    db_path: PathBuf,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a test application whose payment gateway points at an
    /// unroutable address. Fine for every flow that never reaches the
    /// gateway (COD, reads, admin transitions).
    pub async fn new() -> Self {
        Self::with_gateway("http://127.0.0.1:1").await
    }

    /// Construct a test application whose payment gateway base URL points at
    /// the given server (normally a wiremock instance).
    pub async fn with_gateway(gateway_base_url: &str) -> Self {
        let db_path =
            std::env::temp_dir().join(format!("kirana_test_{}.db", Uuid::new_v4().simple()));

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_GATEWAY_KEY_ID,
            TEST_GATEWAY_SECRET,
            "127.0.0.1",
            18_080,
            "test",
        );
        cfg.gateway_base_url = gateway_base_url.to_string();
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), &cfg, event_sender.clone())
            .expect("failed to build services");

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };
        let router = kirana_api::app_router(state.clone());

        Self {
            router,
            state,
            db_path,
            _event_task: event_task,
        }
    }

    /// Sends one request through the router.
    pub async fn request(&self, method: Method, uri: &str, json: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match json {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error")
    }

    /// Registers a serviceable pincode. `delivery_fee = None` exercises the
    /// configured default fee.
    pub async fn seed_pincode(&self, pincode: &str, delivery_fee: Option<Decimal>) {
        serviceable_area::ActiveModel {
            id: Set(Uuid::new_v4()),
            pincode: Set(pincode.to_string()),
            area_name: Set(format!("Area {pincode}")),
            delivery_fee: Set(delivery_fee),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed pincode");
    }

    /// Registers a pincode the store used to serve but no longer does.
    pub async fn seed_inactive_pincode(&self, pincode: &str) {
        serviceable_area::ActiveModel {
            id: Set(Uuid::new_v4()),
            pincode: Set(pincode.to_string()),
            area_name: Set(format!("Area {pincode}")),
            delivery_fee: Set(None),
            is_active: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed pincode");
    }

    pub async fn seed_product(&self, name: &str, category: &str, price: Decimal) -> product::Model {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(None),
            category: Set(category.to_string()),
            sub_category: Set(None),
            price: Set(price),
            weight: Set(None),
            is_active: Set(true),
            is_featured_today: Set(false),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed product")
    }

    pub async fn seed_variant(
        &self,
        product_id: Uuid,
        weight: &str,
        price: Decimal,
    ) -> product_variant::Model {
        product_variant::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            weight: Set(weight.to_string()),
            price: Set(price),
            stock_quantity: Set(100),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed variant")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
    }
}

/// Reads a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
