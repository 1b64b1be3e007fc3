use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::services::payments::gateway::GatewayOrder;

/// Callback payload from the hosted payment UI. Untrusted until it passes
/// signature verification; consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentConfirmation {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
}

/// The two ways the hosted payment UI hands control back.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    Completed(PaymentConfirmation),
    /// The user closed the payment UI. Terminal for the attempt; never
    /// retried automatically.
    Dismissed,
}

/// Contact details prefilled into the payment UI.
#[derive(Debug, Clone, Default)]
pub struct PaymentPrefill {
    pub email: Option<String>,
    pub contact: Option<String>,
}

/// Presents the gateway's hosted payment UI for an order and waits for the
/// user to complete or dismiss it. The single suspension point of the online
/// checkout flow; no timeout is enforced here, an abandoned UI simply means
/// the attempt never resumes.
#[async_trait]
pub trait PaymentCollector: Send + Sync {
    async fn collect(
        &self,
        order: &GatewayOrder,
        prefill: &PaymentPrefill,
    ) -> Result<PaymentOutcome, ServiceError>;
}
