use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One cart line as submitted at checkout. The cart itself is owned by the
/// client session; the server only ever sees it inside a checkout request,
/// so every failure path leaves it intact by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Who is checking out. A tagged variant rather than a struct of nullable
/// fields, so both paths are handled exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckoutCustomer {
    Guest { email: String },
    Authenticated { user_id: Uuid },
}

impl CheckoutCustomer {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            CheckoutCustomer::Guest { .. } => None,
            CheckoutCustomer::Authenticated { user_id } => Some(*user_id),
        }
    }

    pub fn guest_email(&self) -> Option<&str> {
        match self {
            CheckoutCustomer::Guest { email } => Some(email),
            CheckoutCustomer::Authenticated { .. } => None,
        }
    }
}
