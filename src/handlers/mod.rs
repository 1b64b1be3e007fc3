pub mod checkout;
pub mod orders;
pub mod payments;
pub mod products;
pub mod serviceability;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    services::{
        checkout::CheckoutService,
        orders::OrderService,
        payments::{PaymentGateway, SignatureVerifier},
        products::ProductCatalogService,
        serviceability::ServiceabilityService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub serviceability: Arc<ServiceabilityService>,
    pub checkout: Arc<CheckoutService>,
    pub orders: Arc<OrderService>,
    pub products: Arc<ProductCatalogService>,
    pub gateway: Arc<PaymentGateway>,
}

impl AppServices {
    /// Wires the service graph from configuration. Fails when the payment
    /// gateway credentials are absent; that is a startup error, not
    /// something to discover mid-checkout.
    pub fn new(
        db: Arc<DbPool>,
        config: &AppConfig,
        event_sender: EventSender,
    ) -> Result<Self, ServiceError> {
        let gateway = Arc::new(PaymentGateway::new(config)?);
        let verifier = Arc::new(SignatureVerifier::new(config.gateway_key_secret.clone()));
        let serviceability = Arc::new(ServiceabilityService::new(
            db.clone(),
            config.default_delivery_fee,
        ));
        let checkout = Arc::new(CheckoutService::new(
            db.clone(),
            event_sender.clone(),
            serviceability.clone(),
            gateway.clone(),
            verifier,
            config.currency.clone(),
        ));
        let orders = Arc::new(OrderService::new(db.clone(), event_sender));
        let products = Arc::new(ProductCatalogService::new(db));

        Ok(Self {
            serviceability,
            checkout,
            orders,
            products,
            gateway,
        })
    }
}
