use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::AUTHORIZATION;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use crate::{config::AppConfig, errors::ServiceError};

/// Order handle returned by the payment gateway. Opaque to us beyond the id;
/// echoed amount and currency are kept for display and cross-checking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GatewayOrder {
    pub id: String,
    /// Amount in the gateway's minor unit (paise for INR).
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateOrderPayload<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// HTTP client for the payment gateway's order API. Holds the server-side
/// key pair; the secret never leaves this process.
#[derive(Clone, Debug)]
pub struct PaymentGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl PaymentGateway {
    pub fn new(cfg: &AppConfig) -> Result<Self, ServiceError> {
        if cfg.gateway_key_id.trim().is_empty() || cfg.gateway_key_secret.trim().is_empty() {
            return Err(ServiceError::ConfigurationError(
                "payment gateway credentials not configured: set APP__GATEWAY_KEY_ID and APP__GATEWAY_KEY_SECRET"
                    .to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: cfg.gateway_base_url.trim_end_matches('/').to_string(),
            key_id: cfg.gateway_key_id.clone(),
            key_secret: cfg.gateway_key_secret.clone(),
        })
    }

    /// The publishable key id, safe to hand to the hosted payment UI.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    fn basic_auth(&self) -> String {
        format!(
            "Basic {}",
            BASE64.encode(format!("{}:{}", self.key_id, self.key_secret))
        )
    }

    /// Opens an order with the gateway for `amount` in the store's base
    /// currency unit. The amount crosses the wire in minor units.
    #[instrument(skip(self), fields(%currency, %receipt))]
    pub async fn create_order(
        &self,
        amount: Decimal,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, ServiceError> {
        let minor = to_minor_units(amount)?;
        let payload = CreateOrderPayload {
            amount: minor,
            currency,
            receipt,
        };

        let response = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .header(AUTHORIZATION, self.basic_auth())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                ServiceError::PaymentGateway(format!("order creation request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, %body, "gateway order creation failed");
            return Err(ServiceError::PaymentGateway(format!(
                "order creation returned {status}: {body}"
            )));
        }

        let order: GatewayOrder = response.json().await.map_err(|e| {
            ServiceError::PaymentGateway(format!("invalid gateway response: {e}"))
        })?;

        info!(
            gateway_order_id = %order.id,
            amount_minor = order.amount,
            "gateway order created"
        );
        Ok(order)
    }
}

/// Converts a base-unit amount to the gateway's minor unit (×100). Rejects
/// non-positive amounts and amounts with sub-minor-unit precision.
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    if amount <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "amount must be positive".to_string(),
        ));
    }

    let minor = amount * Decimal::ONE_HUNDRED;
    if !minor.fract().is_zero() {
        return Err(ServiceError::ValidationError(
            "amount carries more precision than the currency minor unit".to_string(),
        ));
    }

    minor.to_i64().ok_or_else(|| {
        ServiceError::ValidationError("amount out of representable range".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(dec!(250)).unwrap(), 25_000);
        assert_eq!(to_minor_units(dec!(99.99)).unwrap(), 9_999);
        assert_eq!(to_minor_units(dec!(0.01)).unwrap(), 1);
    }

    #[test]
    fn test_to_minor_units_rejects_bad_amounts() {
        assert_matches!(
            to_minor_units(Decimal::ZERO),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            to_minor_units(dec!(-5)),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            to_minor_units(dec!(1.005)),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn test_basic_auth_header_shape() {
        let cfg = AppConfig::new(
            "sqlite::memory:",
            "key_id",
            "key_secret",
            "127.0.0.1",
            8080,
            "test",
        );
        let gateway = PaymentGateway::new(&cfg).unwrap();
        let header = gateway.basic_auth();

        assert!(header.starts_with("Basic "));
        let decoded = BASE64.decode(header.trim_start_matches("Basic ")).unwrap();
        assert_eq!(decoded, b"key_id:key_secret");
    }

    #[test]
    fn test_missing_credentials_is_configuration_error() {
        let cfg = AppConfig::new("sqlite::memory:", "", "", "127.0.0.1", 8080, "test");
        assert_matches!(
            PaymentGateway::new(&cfg),
            Err(ServiceError::ConfigurationError(_))
        );
    }
}
