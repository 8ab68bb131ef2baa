//! Domain service for API token issuance.
//!
//! Secrets are generated here, shown to the caller once and only ever persisted
//! as a one-way digest.

use crate::domain::{ApiToken, DomainError, IssuedToken, TokenId};

/// Domain service trait for API tokens.
#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    /// Generates a new secret, stores its digest and returns the secret alongside the record.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] if `name` or `created_by_principal` is empty.
    async fn issue(&self, name: &str, created_by_principal: &str)
    -> Result<IssuedToken, DomainError>;

    /// Lists all tokens. The returned shape holds no secret material.
    async fn list(&self) -> Result<Vec<ApiToken>, DomainError>;

    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] if no token has this id.
    async fn revoke(&self, id: &TokenId) -> Result<(), DomainError>;

    /// Resolves a presented bearer secret to its token, recording the use.
    async fn verify(&self, secret: &str) -> Result<Option<ApiToken>, DomainError>;
}
