use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{format_timestamp, parse_timestamp};
use crate::domain::{ApiToken, DomainError, NewApiToken, TokenId, TokenRepository};
use crate::entities::{api_tokens, prelude::*};

/// Repository for API token rows. The stored digest never leaves this type.
pub struct SeaOrmTokenRepository {
    conn: DatabaseConnection,
}

impl SeaOrmTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: api_tokens::Model) -> Result<ApiToken, DomainError> {
        Ok(ApiToken {
            id: TokenId::from(model.id),
            name: model.name,
            last_used_at: model
                .last_used_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            created_at: parse_timestamp(&model.created_at)?,
            created_by_principal: model.created_by_principal,
        })
    }
}

#[async_trait]
impl TokenRepository for SeaOrmTokenRepository {
    async fn create(&self, token: NewApiToken) -> Result<ApiToken, DomainError> {
        let active_model = api_tokens::ActiveModel {
            id: Set(TokenId::generate().to_string()),
            name: Set(token.name),
            token_hash: Set(token.secret_hash),
            last_used_at: Set(None),
            created_at: Set(format_timestamp(Utc::now())),
            created_by_principal: Set(token.created_by_principal),
        };

        let model = active_model.insert(&self.conn).await?;
        Self::map_model(model)
    }

    async fn get_all(&self) -> Result<Vec<ApiToken>, DomainError> {
        let rows = ApiTokens::find()
            .order_by_asc(api_tokens::Column::CreatedAt)
            .order_by_asc(api_tokens::Column::Id)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(Self::map_model).collect()
    }

    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<Option<ApiToken>, DomainError> {
        ApiTokens::find()
            .filter(api_tokens::Column::TokenHash.eq(secret_hash))
            .one(&self.conn)
            .await?
            .map(Self::map_model)
            .transpose()
    }

    async fn touch_last_used(&self, id: &TokenId) -> Result<(), DomainError> {
        ApiTokens::update_many()
            .col_expr(
                api_tokens::Column::LastUsedAt,
                Expr::value(Some(format_timestamp(Utc::now()))),
            )
            .filter(api_tokens::Column::Id.eq(id.as_str()))
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: &TokenId) -> Result<(), DomainError> {
        let result = ApiTokens::delete_by_id(id.as_str().to_owned())
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::token_not_found(id.as_str()));
        }

        Ok(())
    }
}
