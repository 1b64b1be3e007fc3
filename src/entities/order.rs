use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An order header. Written exactly once at checkout commit; after that only
/// `status`, `payment_*` and `updated_at` ever change, through the admin
/// status-update path and the payment verifier.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Account that placed the order; `None` for guest checkout.
    pub user_id: Option<Uuid>,
    pub guest_email: Option<String>,

    pub total_amount: Decimal,
    pub delivery_fee: Decimal,

    /// "cod" | "online"
    pub payment_method: String,
    /// "cod" | "prepaid"
    pub payment_mode: String,
    /// "pending" | "completed"
    pub payment_status: String,
    /// Order status machine; see `models::order::OrderStatus`.
    pub status: String,

    pub delivery_address: String,
    pub delivery_pincode: String,
    pub phone_number: String,

    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        Ok(self)
    }
}
