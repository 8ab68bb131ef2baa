//! Persistence contracts consumed by the services.
//!
//! Every operation maps to a single statement, so each call is atomic on its own.
//! Implementations must be safe to share across concurrent requests.

use async_trait::async_trait;

use super::{ApiToken, DomainError, Feature, FeatureId, FeatureInput, NewApiToken, TokenId};

#[async_trait]
pub trait FeatureRepository: Send + Sync {
    /// Inserts a flag, stamping a fresh id and creation time.
    async fn create(&self, input: FeatureInput) -> Result<Feature, DomainError>;

    async fn get_by_id(&self, id: &FeatureId) -> Result<Feature, DomainError>;

    async fn get_all(&self) -> Result<Vec<Feature>, DomainError>;

    /// Replaces name, value, resource id and active state. `NotFound` when no row matched.
    async fn update(&self, id: &FeatureId, input: FeatureInput) -> Result<Feature, DomainError>;

    /// Writes only the active column. `NotFound` when no row matched.
    async fn set_active(&self, id: &FeatureId, active: bool) -> Result<Feature, DomainError>;

    async fn delete(&self, id: &FeatureId) -> Result<(), DomainError>;
}

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn create(&self, token: NewApiToken) -> Result<ApiToken, DomainError>;

    async fn get_all(&self) -> Result<Vec<ApiToken>, DomainError>;

    /// Looks a token up by the digest of its secret.
    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<Option<ApiToken>, DomainError>;

    async fn touch_last_used(&self, id: &TokenId) -> Result<(), DomainError>;

    async fn delete(&self, id: &TokenId) -> Result<(), DomainError>;
}
