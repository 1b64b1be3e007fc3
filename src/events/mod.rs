use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Domain events emitted by the services and consumed by the in-process
/// event processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderCancelled(Uuid),

    // Checkout / payment events
    CheckoutStarted {
        checkout_id: String,
        gateway_order_id: String,
    },
    PaymentVerified {
        order_id: Uuid,
        gateway_order_id: String,
        gateway_payment_id: String,
    },
    /// A gateway-supplied signature failed verification. Candidate
    /// fraud/tampering signal.
    PaymentSignatureMismatch {
        gateway_order_id: String,
        gateway_payment_id: String,
    },
    /// A payment was captured but the order rows could not be written.
    /// Requires manual reconciliation against the gateway dashboard.
    PaymentReconciliationRequired {
        gateway_order_id: String,
        gateway_payment_id: String,
        detail: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event at a severity matching its
/// operational weight. Runs as a background task for the lifetime of the
/// process.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::PaymentSignatureMismatch {
                gateway_order_id,
                gateway_payment_id,
            } => {
                warn!(
                    target: "kirana_api::payments",
                    %gateway_order_id,
                    %gateway_payment_id,
                    "payment signature mismatch"
                );
            }
            Event::PaymentReconciliationRequired {
                gateway_order_id,
                gateway_payment_id,
                detail,
            } => {
                error!(
                    %gateway_order_id,
                    %gateway_payment_id,
                    %detail,
                    "captured payment without persisted order; reconcile manually"
                );
            }
            other => {
                info!(event = ?other, "domain event");
            }
        }
    }
}
