use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::cart::CartLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

/// Derives subtotal and grand total from the cart lines. Pure; cart
/// mutations always recompute from scratch rather than adjusting a running
/// total.
pub fn order_totals(lines: &[CartLine], delivery_fee: Decimal) -> OrderTotals {
    let subtotal: Decimal = lines.iter().map(CartLine::line_total).sum();
    OrderTotals {
        subtotal,
        delivery_fee,
        total: subtotal + delivery_fee,
    }
}
