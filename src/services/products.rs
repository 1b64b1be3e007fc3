use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::{
        product::{self, Entity as Product},
        product_variant::{self, Entity as ProductVariant},
    },
    errors::ServiceError,
};

/// Read-only catalog surface consumed by the storefront upstream of
/// checkout.
#[derive(Clone)]
pub struct ProductCatalogService {
    db: Arc<DatabaseConnection>,
}

impl ProductCatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        category: Option<String>,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let mut query = Product::find()
            .filter(product::Column::IsActive.eq(true))
            .order_by_asc(product::Column::Name);

        if let Some(category) = category {
            query = query.filter(product::Column::Category.eq(category));
        }

        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn list_variants(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<product_variant::Model>, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let variants = ProductVariant::find()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .filter(product_variant::Column::IsActive.eq(true))
            .order_by_asc(product_variant::Column::Price)
            .all(&*self.db)
            .await?;
        Ok(variants)
    }
}
