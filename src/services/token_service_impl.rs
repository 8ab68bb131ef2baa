//! Repository-backed implementation of the `TokenService` trait.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::{ApiToken, DomainError, IssuedToken, NewApiToken, TokenId, TokenRepository};
use crate::services::token_service::TokenService;

/// Bytes of entropy in every issued secret.
pub const SECRET_LENGTH: usize = 32;

pub struct DefaultTokenService {
    repo: Arc<dyn TokenRepository>,
}

impl DefaultTokenService {
    #[must_use]
    pub fn new(repo: Arc<dyn TokenRepository>) -> Self {
        Self { repo }
    }

    fn validate(name: &str, created_by_principal: &str) -> Result<(), DomainError> {
        if name.is_empty() {
            return Err(DomainError::validation("token name cannot be empty"));
        }
        if created_by_principal.is_empty() {
            return Err(DomainError::validation(
                "creating principal cannot be empty",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenService for DefaultTokenService {
    async fn issue(
        &self,
        name: &str,
        created_by_principal: &str,
    ) -> Result<IssuedToken, DomainError> {
        Self::validate(name, created_by_principal)?;

        let secret = generate_secret()?;
        let token = self
            .repo
            .create(NewApiToken {
                name: name.to_string(),
                secret_hash: hash_secret(&secret),
                created_by_principal: created_by_principal.to_string(),
            })
            .await?;

        metrics::counter!("tokens_issued_total").increment(1);
        info!(
            token_id = %token.id,
            principal = %token.created_by_principal,
            "Issued API token '{}'",
            token.name
        );

        Ok(IssuedToken { secret, token })
    }

    async fn list(&self) -> Result<Vec<ApiToken>, DomainError> {
        self.repo.get_all().await
    }

    async fn revoke(&self, id: &TokenId) -> Result<(), DomainError> {
        self.repo.delete(id).await?;

        metrics::counter!("tokens_revoked_total").increment(1);
        info!(token_id = %id, "Revoked API token");
        Ok(())
    }

    async fn verify(&self, secret: &str) -> Result<Option<ApiToken>, DomainError> {
        if secret.is_empty() {
            return Ok(None);
        }

        let Some(token) = self.repo.find_by_secret_hash(&hash_secret(secret)).await? else {
            return Ok(None);
        };

        if let Err(e) = self.repo.touch_last_used(&token.id).await {
            warn!(token_id = %token.id, "Failed to record token use: {e}");
        }

        Ok(Some(token))
    }
}

/// Draws a fresh secret from the operating system's CSPRNG, URL-safe base64 encoded.
pub fn generate_secret() -> Result<Zeroizing<String>, DomainError> {
    let mut bytes = Zeroizing::new([0u8; SECRET_LENGTH]);
    OsRng
        .try_fill_bytes(&mut bytes[..])
        .map_err(|e| DomainError::internal(format!("OS random source unavailable: {e}")))?;

    Ok(Zeroizing::new(URL_SAFE.encode(&bytes[..])))
}

/// Lowercase hex SHA-256 of the encoded secret.
#[must_use]
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}
