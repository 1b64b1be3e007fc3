use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{order, order_item},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        cart::{CartLine, CheckoutCustomer},
        order::{OrderStatus, PaymentMethod, PaymentMode, PaymentStatus},
    },
    services::{
        payments::{
            GatewayOrder, PaymentCollector, PaymentConfirmation, PaymentGateway, PaymentOutcome,
            PaymentPrefill, SignatureVerifier,
        },
        serviceability::ServiceabilityService,
        totals::{order_totals, OrderTotals},
    },
};

/// Identical resubmissions inside this window (a double-click, an impatient
/// refresh) land on the same checkout id and re-use the open gateway order.
const RECEIPT_WINDOW_SECS: i64 = 60;

/// Checkout request as submitted by the storefront.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderRequest {
    pub customer: CheckoutCustomer,
    #[validate(length(min = 7, max = 15, message = "phone number must be 7-15 characters"))]
    pub phone_number: String,
    #[validate(length(min = 1, message = "delivery address is required"))]
    pub delivery_address: String,
    #[validate(length(min = 4, max = 10, message = "pincode must be 4-10 characters"))]
    pub delivery_pincode: String,
    pub payment_method: PaymentMethod,
    pub lines: Vec<CartLine>,
}

/// What `place_order` resolved to.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// COD: the order is committed immediately.
    Placed(order::Model),
    /// Online: the client must complete payment through the hosted UI.
    PaymentRequired(OnlineCheckout),
}

/// Handle returned to the client so it can open the hosted payment UI.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OnlineCheckout {
    pub checkout_id: String,
    pub gateway_order: GatewayOrder,
    /// Publishable gateway key id for the client-side SDK.
    pub key_id: String,
}

/// Result of driving a full online attempt through a [`PaymentCollector`].
#[derive(Debug)]
pub enum OnlineCheckoutOutcome {
    Placed(order::Model),
    /// The user dismissed the payment UI; no order exists.
    Abandoned,
}

/// Draft of an order that has passed serviceability and totals but is not
/// yet committed.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    customer: CheckoutCustomer,
    phone_number: String,
    delivery_address: String,
    delivery_pincode: String,
    lines: Vec<CartLine>,
    totals: OrderTotals,
}

/// An online checkout awaiting payment confirmation. Lives only in memory:
/// if it is never confirmed, no order row ever exists and there is nothing
/// to clean up.
#[derive(Debug, Clone)]
struct PendingCheckout {
    draft: OrderDraft,
    gateway_order: GatewayOrder,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

enum CommitPayment {
    CashOnDelivery,
    Prepaid { confirmation: PaymentConfirmation },
}

/// Orchestrates the checkout sequence: serviceability, totals, gateway
/// order, signature verification, and the atomic order commit.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    serviceability: Arc<ServiceabilityService>,
    gateway: Arc<PaymentGateway>,
    verifier: Arc<SignatureVerifier>,
    pending: Arc<DashMap<String, PendingCheckout>>,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        serviceability: Arc<ServiceabilityService>,
        gateway: Arc<PaymentGateway>,
        verifier: Arc<SignatureVerifier>,
        currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            serviceability,
            gateway,
            verifier,
            pending: Arc::new(DashMap::new()),
            currency,
        }
    }

    /// Runs the checkout sequence up to (and for COD, including) the order
    /// commit. The online path stops at the gateway order; the client
    /// resumes via [`confirm_payment`](Self::confirm_payment).
    #[instrument(
        skip(self, request),
        fields(pincode = %request.delivery_pincode, payment_method = %request.payment_method)
    )]
    pub async fn place_order(
        &self,
        request: PlaceOrderRequest,
    ) -> Result<CheckoutOutcome, ServiceError> {
        validate_request(&request)?;

        let delivery_fee = self
            .serviceability
            .require(&request.delivery_pincode)
            .await?;
        let totals = order_totals(&request.lines, delivery_fee);

        let payment_method = request.payment_method;
        let draft = OrderDraft {
            customer: request.customer,
            phone_number: request.phone_number,
            delivery_address: request.delivery_address,
            delivery_pincode: request.delivery_pincode,
            lines: request.lines,
            totals,
        };

        match payment_method {
            PaymentMethod::Cod => {
                let committed = self
                    .commit_order(&draft, CommitPayment::CashOnDelivery)
                    .await?;
                Ok(CheckoutOutcome::Placed(committed))
            }
            PaymentMethod::Online => self
                .begin_online_payment(draft)
                .await
                .map(CheckoutOutcome::PaymentRequired),
        }
    }

    async fn begin_online_payment(
        &self,
        draft: OrderDraft,
    ) -> Result<OnlineCheckout, ServiceError> {
        let checkout_id = derive_checkout_id(&draft);

        if let Some(existing) = self.pending.get(&checkout_id) {
            info!(%checkout_id, "re-using open checkout attempt");
            return Ok(OnlineCheckout {
                checkout_id: checkout_id.clone(),
                gateway_order: existing.gateway_order.clone(),
                key_id: self.gateway.key_id().to_string(),
            });
        }

        let gateway_order = self
            .gateway
            .create_order(draft.totals.total, &self.currency, &checkout_id)
            .await?;

        self.pending.insert(
            checkout_id.clone(),
            PendingCheckout {
                draft,
                gateway_order: gateway_order.clone(),
                created_at: Utc::now(),
            },
        );

        self.emit(Event::CheckoutStarted {
            checkout_id: checkout_id.clone(),
            gateway_order_id: gateway_order.id.clone(),
        })
        .await;

        Ok(OnlineCheckout {
            checkout_id,
            gateway_order,
            key_id: self.gateway.key_id().to_string(),
        })
    }

    /// Verifies a payment confirmation against the open checkout attempt and,
    /// only on an exact signature match, commits the order as paid.
    #[instrument(
        skip(self, confirmation),
        fields(%checkout_id, gateway_order_id = %confirmation.gateway_order_id)
    )]
    pub async fn confirm_payment(
        &self,
        checkout_id: &str,
        confirmation: PaymentConfirmation,
    ) -> Result<order::Model, ServiceError> {
        let attempt_gateway_order = self
            .pending
            .get(checkout_id)
            .map(|entry| entry.gateway_order.id.clone())
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No open checkout attempt {checkout_id}"))
            })?;

        if confirmation.gateway_order_id != attempt_gateway_order {
            warn!(
                target: "kirana_api::payments",
                expected = %attempt_gateway_order,
                received = %confirmation.gateway_order_id,
                "confirmation does not reference this attempt's gateway order"
            );
            self.emit_signature_mismatch(&confirmation).await;
            return Err(ServiceError::SignatureMismatch);
        }

        if !self.verifier.verify(
            &confirmation.gateway_order_id,
            &confirmation.gateway_payment_id,
            &confirmation.gateway_signature,
        ) {
            warn!(
                target: "kirana_api::payments",
                gateway_order_id = %confirmation.gateway_order_id,
                gateway_payment_id = %confirmation.gateway_payment_id,
                "signature verification failed"
            );
            self.emit_signature_mismatch(&confirmation).await;
            return Err(ServiceError::SignatureMismatch);
        }

        // Claim the attempt; a concurrent duplicate confirmation loses here.
        let Some((_, pending)) = self.pending.remove(checkout_id) else {
            return Err(ServiceError::InvalidOperation(format!(
                "checkout attempt {checkout_id} already processed"
            )));
        };

        let gateway_order_id = confirmation.gateway_order_id.clone();
        let gateway_payment_id = confirmation.gateway_payment_id.clone();

        match self
            .commit_order(&pending.draft, CommitPayment::Prepaid { confirmation })
            .await
        {
            Ok(committed) => {
                self.emit(Event::PaymentVerified {
                    order_id: committed.id,
                    gateway_order_id,
                    gateway_payment_id,
                })
                .await;
                Ok(committed)
            }
            Err(err) => {
                // The payment is already captured at the gateway. Keep the
                // attempt so a retried confirmation can re-attempt the
                // commit, and flag the payment for reconciliation.
                self.pending.insert(checkout_id.to_string(), pending);
                self.emit(Event::PaymentReconciliationRequired {
                    gateway_order_id,
                    gateway_payment_id,
                    detail: err.to_string(),
                })
                .await;
                Err(err)
            }
        }
    }

    /// Straight-line online checkout: create the gateway order, suspend on
    /// the collector, then verify and commit. Dismissal is terminal for the
    /// attempt and leaves no order behind.
    pub async fn run_online_checkout(
        &self,
        request: PlaceOrderRequest,
        collector: &dyn PaymentCollector,
    ) -> Result<OnlineCheckoutOutcome, ServiceError> {
        let prefill = PaymentPrefill {
            email: request.customer.guest_email().map(str::to_string),
            contact: Some(request.phone_number.clone()),
        };

        let online = match self.place_order(request).await? {
            CheckoutOutcome::Placed(committed) => {
                return Ok(OnlineCheckoutOutcome::Placed(committed))
            }
            CheckoutOutcome::PaymentRequired(online) => online,
        };

        match collector.collect(&online.gateway_order, &prefill).await? {
            PaymentOutcome::Completed(confirmation) => self
                .confirm_payment(&online.checkout_id, confirmation)
                .await
                .map(OnlineCheckoutOutcome::Placed),
            PaymentOutcome::Dismissed => {
                info!(
                    checkout_id = %online.checkout_id,
                    "payment UI dismissed; checkout attempt abandoned"
                );
                self.pending.remove(&online.checkout_id);
                Ok(OnlineCheckoutOutcome::Abandoned)
            }
        }
    }

    /// Number of checkout attempts awaiting payment confirmation.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Writes the order header and all of its items as one transaction:
    /// either every row lands or none does.
    async fn commit_order(
        &self,
        draft: &OrderDraft,
        payment: CommitPayment,
    ) -> Result<order::Model, ServiceError> {
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let (payment_method, payment_mode, payment_status, status) = match &payment {
            CommitPayment::CashOnDelivery => (
                PaymentMethod::Cod,
                PaymentMode::Cod,
                PaymentStatus::Pending,
                OrderStatus::Pending,
            ),
            CommitPayment::Prepaid { .. } => (
                PaymentMethod::Online,
                PaymentMode::Prepaid,
                PaymentStatus::Completed,
                OrderStatus::Confirmed,
            ),
        };

        let (gateway_order_id, gateway_payment_id, gateway_signature) = match &payment {
            CommitPayment::CashOnDelivery => (None, None, None),
            CommitPayment::Prepaid { confirmation } => (
                Some(confirmation.gateway_order_id.clone()),
                Some(confirmation.gateway_payment_id.clone()),
                Some(confirmation.gateway_signature.clone()),
            ),
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| commit_error(&payment, e))?;

        let header = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(draft.customer.user_id()),
            guest_email: Set(draft.customer.guest_email().map(str::to_string)),
            total_amount: Set(draft.totals.total),
            delivery_fee: Set(draft.totals.delivery_fee),
            payment_method: Set(payment_method.to_string()),
            payment_mode: Set(payment_mode.to_string()),
            payment_status: Set(payment_status.to_string()),
            status: Set(status.to_string()),
            delivery_address: Set(draft.delivery_address.clone()),
            delivery_pincode: Set(draft.delivery_pincode.clone()),
            phone_number: Set(draft.phone_number.clone()),
            gateway_order_id: Set(gateway_order_id),
            gateway_payment_id: Set(gateway_payment_id),
            gateway_signature: Set(gateway_signature),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let committed = header
            .insert(&txn)
            .await
            .map_err(|e| commit_error(&payment, e))?;

        for line in &draft.lines {
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product_id),
                variant_id: Set(line.variant_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                total_price: Set(line.line_total()),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(|e| commit_error(&payment, e))?;
        }

        txn.commit().await.map_err(|e| commit_error(&payment, e))?;

        info!(
            order_id = %committed.id,
            total = %committed.total_amount,
            status = %committed.status,
            "order committed"
        );

        self.emit(Event::OrderCreated(order_id)).await;

        Ok(committed)
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "failed to send domain event");
        }
    }

    async fn emit_signature_mismatch(&self, confirmation: &PaymentConfirmation) {
        self.emit(Event::PaymentSignatureMismatch {
            gateway_order_id: confirmation.gateway_order_id.clone(),
            gateway_payment_id: confirmation.gateway_payment_id.clone(),
        })
        .await;
    }
}

/// A commit failure on the prepaid path means money has moved without an
/// order row; tag the error with the gateway ids so it can be reconciled.
fn commit_error(payment: &CommitPayment, e: sea_orm::DbErr) -> ServiceError {
    match payment {
        CommitPayment::CashOnDelivery => ServiceError::DatabaseError(e),
        CommitPayment::Prepaid { confirmation } => ServiceError::OrderCommit {
            gateway_order_id: confirmation.gateway_order_id.clone(),
            gateway_payment_id: confirmation.gateway_payment_id.clone(),
            detail: e.to_string(),
        },
    }
}

fn validate_request(request: &PlaceOrderRequest) -> Result<(), ServiceError> {
    request.validate()?;

    if request.lines.is_empty() {
        return Err(ServiceError::ValidationError(
            "cart must contain at least one line".to_string(),
        ));
    }
    for line in &request.lines {
        if line.quantity < 1 {
            return Err(ServiceError::ValidationError(format!(
                "quantity must be at least 1 for product {}",
                line.product_id
            )));
        }
        if line.unit_price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "unit price must be positive for product {}",
                line.product_id
            )));
        }
    }

    if let CheckoutCustomer::Guest { email } = &request.customer {
        if !email.contains('@') {
            return Err(ServiceError::ValidationError(
                "guest email address is invalid".to_string(),
            ));
        }
    }

    Ok(())
}

/// Deterministic id for a checkout attempt: the same customer submitting the
/// same cart to the same pincode inside the receipt window maps to the same
/// id, which doubles as the gateway receipt.
fn derive_checkout_id(draft: &OrderDraft) -> String {
    let mut hasher = Sha256::new();

    match &draft.customer {
        CheckoutCustomer::Guest { email } => hasher.update(email.as_bytes()),
        CheckoutCustomer::Authenticated { user_id } => hasher.update(user_id.as_bytes()),
    }
    hasher.update(draft.delivery_pincode.as_bytes());
    for line in &draft.lines {
        hasher.update(line.product_id.as_bytes());
        if let Some(variant_id) = line.variant_id {
            hasher.update(variant_id.as_bytes());
        }
        hasher.update(line.unit_price.to_string().as_bytes());
        hasher.update(line.quantity.to_le_bytes());
    }
    hasher.update((Utc::now().timestamp() / RECEIPT_WINDOW_SECS).to_le_bytes());

    format!("ckt_{}", hex::encode(&hasher.finalize()[..12]))
}
