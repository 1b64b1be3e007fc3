use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Order lifecycle. Transitions run strictly forward; `Cancelled` is
/// reachable from any non-terminal state and is never left again.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Confirmed)
            | (Confirmed, Preparing)
            | (Preparing, OutForDelivery)
            | (OutForDelivery, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    Online,
}

/// How the order is (to be) paid for, as recorded on the order row.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMode {
    Cod,
    Prepaid,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(Pending, Confirmed, true)]
    #[case(Confirmed, Preparing, true)]
    #[case(Preparing, OutForDelivery, true)]
    #[case(OutForDelivery, Delivered, true)]
    #[case(Pending, Cancelled, true)]
    #[case(OutForDelivery, Cancelled, true)]
    #[case(Delivered, Cancelled, false)]
    #[case(Cancelled, Cancelled, false)]
    #[case(Delivered, Preparing, false)]
    #[case(Confirmed, Pending, false)]
    #[case(Pending, Preparing, false)]
    fn test_status_transitions(
        #[case] from: OrderStatus,
        #[case] to: OrderStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed, "{from} -> {to}");
    }

    #[test]
    fn test_status_string_round_trip() {
        assert_eq!(OutForDelivery.to_string(), "out_for_delivery");
        assert_eq!(
            OrderStatus::from_str("out_for_delivery").unwrap(),
            OutForDelivery
        );
        assert!(OrderStatus::from_str("shipped").is_err());
    }

    #[test]
    fn test_payment_enums_render_snake_case() {
        assert_eq!(PaymentMethod::Cod.to_string(), "cod");
        assert_eq!(PaymentMode::Prepaid.to_string(), "prepaid");
        assert_eq!(PaymentStatus::Completed.to_string(), "completed");
    }
}
