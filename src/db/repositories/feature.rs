use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use super::{format_timestamp, parse_timestamp};
use crate::domain::{DomainError, Feature, FeatureId, FeatureInput, FeatureRepository, FlagValue};
use crate::entities::{features, prelude::*};

/// Repository for feature flag rows
pub struct SeaOrmFeatureRepository {
    conn: DatabaseConnection,
}

impl SeaOrmFeatureRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: features::Model) -> Result<Feature, DomainError> {
        Ok(Feature {
            id: FeatureId::from(model.id),
            name: model.name,
            value: FlagValue::from_stored(model.value),
            resource_id: model.resource_id,
            active: model.active,
            created_at: parse_timestamp(&model.created_at)?,
        })
    }
}

#[async_trait]
impl FeatureRepository for SeaOrmFeatureRepository {
    async fn create(&self, input: FeatureInput) -> Result<Feature, DomainError> {
        let id = FeatureId::generate();

        let active_model = features::ActiveModel {
            id: Set(id.to_string()),
            name: Set(input.name),
            value: Set(input.value.into_stored()),
            resource_id: Set(input.resource_id),
            active: Set(input.active),
            created_at: Set(format_timestamp(Utc::now())),
        };

        let model = active_model.insert(&self.conn).await?;
        debug!(feature_id = %id, "Inserted feature row");
        Self::map_model(model)
    }

    async fn get_by_id(&self, id: &FeatureId) -> Result<Feature, DomainError> {
        let model = Features::find_by_id(id.as_str().to_owned())
            .one(&self.conn)
            .await?
            .ok_or_else(|| DomainError::feature_not_found(id.as_str()))?;

        Self::map_model(model)
    }

    async fn get_all(&self) -> Result<Vec<Feature>, DomainError> {
        let rows = Features::find()
            .order_by_asc(features::Column::CreatedAt)
            .order_by_asc(features::Column::Id)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(Self::map_model).collect()
    }

    async fn update(&self, id: &FeatureId, input: FeatureInput) -> Result<Feature, DomainError> {
        let result = Features::update_many()
            .col_expr(features::Column::Name, Expr::value(input.name))
            .col_expr(features::Column::Value, Expr::value(input.value.into_stored()))
            .col_expr(features::Column::ResourceId, Expr::value(input.resource_id))
            .col_expr(features::Column::Active, Expr::value(input.active))
            .filter(features::Column::Id.eq(id.as_str()))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::feature_not_found(id.as_str()));
        }

        self.get_by_id(id).await
    }

    async fn set_active(&self, id: &FeatureId, active: bool) -> Result<Feature, DomainError> {
        let result = Features::update_many()
            .col_expr(features::Column::Active, Expr::value(active))
            .filter(features::Column::Id.eq(id.as_str()))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::feature_not_found(id.as_str()));
        }

        self.get_by_id(id).await
    }

    async fn delete(&self, id: &FeatureId) -> Result<(), DomainError> {
        let result = Features::delete_by_id(id.as_str().to_owned())
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::feature_not_found(id.as_str()));
        }

        Ok(())
    }
}
