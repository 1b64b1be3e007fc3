use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use crate::{
    entities::serviceable_area::{self, Entity as ServiceableArea},
    errors::ServiceError,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceabilityStatus {
    pub serviceable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<Decimal>,
}

impl ServiceabilityStatus {
    fn not_serviceable() -> Self {
        Self {
            serviceable: false,
            delivery_fee: None,
        }
    }
}

/// Checks postal codes against the serviceable-area registry.
#[derive(Clone)]
pub struct ServiceabilityService {
    db: Arc<DatabaseConnection>,
    default_delivery_fee: Decimal,
}

impl ServiceabilityService {
    pub fn new(db: Arc<DatabaseConnection>, default_delivery_fee: Decimal) -> Self {
        Self {
            db,
            default_delivery_fee,
        }
    }

    /// Whether delivery is currently offered for `pincode`. A lookup failure
    /// is reported as not serviceable: blocking a legitimate order is the
    /// smaller failure than promising delivery we cannot make.
    #[instrument(skip(self))]
    pub async fn check(&self, pincode: &str) -> ServiceabilityStatus {
        let lookup = ServiceableArea::find()
            .filter(serviceable_area::Column::Pincode.eq(pincode))
            .filter(serviceable_area::Column::IsActive.eq(true))
            .one(&*self.db)
            .await;

        match lookup {
            Ok(Some(area)) => ServiceabilityStatus {
                serviceable: true,
                delivery_fee: Some(area.delivery_fee.unwrap_or(self.default_delivery_fee)),
            },
            Ok(None) => {
                info!(%pincode, "pincode not serviceable");
                ServiceabilityStatus::not_serviceable()
            }
            Err(e) => {
                error!(%pincode, error = %e, "serviceability lookup failed; failing closed");
                ServiceabilityStatus::not_serviceable()
            }
        }
    }

    /// Like [`check`](Self::check), but an unserviceable pincode becomes an
    /// error carrying the user-facing message. Returns the delivery fee for
    /// the area on success.
    pub async fn require(&self, pincode: &str) -> Result<Decimal, ServiceError> {
        let status = self.check(pincode).await;
        if status.serviceable {
            Ok(status.delivery_fee.unwrap_or(self.default_delivery_fee))
        } else {
            Err(ServiceError::NotServiceable(pincode.to_string()))
        }
    }
}
