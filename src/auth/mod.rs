//! Resolves bearer credentials to an authenticated [`Principal`].
//!
//! Two credential kinds are accepted: RS256 JWTs signed by the configured identity
//! provider, and API tokens issued by this service. A credential shaped like a JWT
//! is only ever checked as a JWT when a verification key is configured.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::AuthConfig;
use crate::services::TokenService;

/// Prefix of principals resolved from API tokens.
pub const TOKEN_PRINCIPAL_PREFIX: &str = "token:";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("authentication unavailable: {0}")]
    Unavailable(String),
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub permissions: Vec<String>,
}

impl Principal {
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            permissions: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    permissions: Vec<String>,
}

/// Verifies RS256 JWTs against a single public key.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn from_pem(
        pem: &str,
        issuer: Option<&str>,
        audience: Option<&str>,
    ) -> anyhow::Result<Self> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| anyhow::anyhow!("Invalid JWT public key: {e}"))?;

        let mut validation = Validation::new(Algorithm::RS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self { key, validation })
    }

    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;

        if data.claims.sub.is_empty() {
            return Err(AuthError::InvalidCredential(
                "token has no subject".to_string(),
            ));
        }

        Ok(Principal {
            subject: data.claims.sub,
            permissions: data.claims.permissions,
        })
    }
}

pub struct Authenticator {
    jwt: Option<JwtVerifier>,
    tokens: Option<Arc<dyn TokenService>>,
}

impl Authenticator {
    #[must_use]
    pub fn new(jwt: Option<JwtVerifier>, tokens: Option<Arc<dyn TokenService>>) -> Self {
        Self { jwt, tokens }
    }

    pub fn from_config(config: &AuthConfig, tokens: Arc<dyn TokenService>) -> anyhow::Result<Self> {
        let jwt = config
            .jwt_public_key_pem
            .as_deref()
            .map(|pem| {
                JwtVerifier::from_pem(
                    pem,
                    config.jwt_issuer.as_deref(),
                    config.jwt_audience.as_deref(),
                )
            })
            .transpose()?;

        let tokens = config.allow_api_tokens.then_some(tokens);

        Ok(Self::new(jwt, tokens))
    }

    /// Authenticates the raw value of an `Authorization` header.
    pub async fn authenticate_header(&self, header: Option<&str>) -> Result<Principal, AuthError> {
        let credential = bearer_credential(header)?;
        self.authenticate(credential).await
    }

    pub async fn authenticate(&self, credential: &str) -> Result<Principal, AuthError> {
        if let Some(jwt) = &self.jwt
            && looks_like_jwt(credential)
        {
            return jwt.verify(credential);
        }

        let Some(tokens) = &self.tokens else {
            return Err(AuthError::InvalidCredential(
                "credential is not an accepted JWT".to_string(),
            ));
        };

        match tokens.verify(credential).await {
            Ok(Some(token)) => Ok(Principal::new(format!(
                "{TOKEN_PRINCIPAL_PREFIX}{}",
                token.id
            ))),
            Ok(None) => {
                debug!("Rejected unknown API token");
                Err(AuthError::InvalidCredential("unknown API token".to_string()))
            }
            Err(e) => Err(AuthError::Unavailable(e.to_string())),
        }
    }
}

/// Pulls the credential out of a `Bearer <credential>` header value.
pub fn bearer_credential(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;

    let (scheme, credential) = header
        .split_once(' ')
        .ok_or_else(|| AuthError::InvalidCredential("malformed authorization header".into()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidCredential(format!(
            "unsupported authorization scheme '{scheme}'"
        )));
    }

    let credential = credential.trim();
    if credential.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    Ok(credential)
}

fn looks_like_jwt(credential: &str) -> bool {
    let mut segments = 0;
    for segment in credential.split('.') {
        if segment.is_empty() {
            return false;
        }
        segments += 1;
    }
    segments == 3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::services::DefaultTokenService;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/jwt_test_key.pem");
    const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/jwt_test_key.pub.pem");

    fn sign(claims: &serde_json::Value) -> String {
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
        encode(&Header::new(Algorithm::RS256), claims, &key).unwrap()
    }

    fn in_an_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    async fn token_service() -> Arc<dyn TokenService> {
        let store = Store::new("sqlite::memory:").await.unwrap();
        Arc::new(DefaultTokenService::new(store.token_repo()))
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_credential(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_credential(Some("bearer  abc ")).unwrap(), "abc");
        assert!(matches!(
            bearer_credential(None),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            bearer_credential(Some("Bearer ")),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            bearer_credential(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidCredential(_))
        ));
        assert!(matches!(
            bearer_credential(Some("abc")),
            Err(AuthError::InvalidCredential(_))
        ));
    }

    #[test]
    fn jwt_shape_detection() {
        assert!(looks_like_jwt("a.b.c"));
        assert!(!looks_like_jwt("a.b"));
        assert!(!looks_like_jwt("a..c"));
        assert!(!looks_like_jwt("c2VjcmV0LXRva2Vu"));
    }

    #[test]
    fn jwt_with_subject_and_permissions_is_accepted() {
        let verifier = JwtVerifier::from_pem(PUBLIC_KEY, None, None).unwrap();
        let token = sign(&json!({
            "sub": "user_123",
            "permissions": ["features:write"],
            "exp": in_an_hour(),
        }));

        let principal = verifier.verify(&token).unwrap();
        assert_eq!(principal.subject, "user_123");
        assert_eq!(principal.permissions, vec!["features:write".to_string()]);
    }

    #[test]
    fn expired_or_foreign_jwts_are_rejected() {
        let verifier =
            JwtVerifier::from_pem(PUBLIC_KEY, Some("https://issuer.test"), None).unwrap();

        let expired = sign(&json!({
            "sub": "user_123",
            "iss": "https://issuer.test",
            "exp": chrono::Utc::now().timestamp() - 3600,
        }));
        assert!(matches!(
            verifier.verify(&expired),
            Err(AuthError::InvalidCredential(_))
        ));

        let wrong_issuer = sign(&json!({
            "sub": "user_123",
            "iss": "https://elsewhere.test",
            "exp": in_an_hour(),
        }));
        assert!(verifier.verify(&wrong_issuer).is_err());

        assert!(verifier.verify("not.a.jwt").is_err());
    }

    #[test]
    fn invalid_public_key_is_a_startup_error() {
        assert!(JwtVerifier::from_pem("not a key", None, None).is_err());
    }

    #[tokio::test]
    async fn api_tokens_resolve_to_token_principals() {
        let tokens = token_service().await;
        let issued = tokens.issue("ci", "user-1").await.unwrap();
        let auth = Authenticator::new(None, Some(tokens));

        let header = format!("Bearer {}", issued.secret.as_str());
        let principal = auth.authenticate_header(Some(&header)).await.unwrap();
        assert_eq!(principal.subject, format!("token:{}", issued.token.id));

        assert!(matches!(
            auth.authenticate("wrong-secret").await,
            Err(AuthError::InvalidCredential(_))
        ));
        assert!(matches!(
            auth.authenticate_header(None).await,
            Err(AuthError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn jwt_and_api_tokens_coexist() {
        let tokens = token_service().await;
        let issued = tokens.issue("ci", "user-1").await.unwrap();
        let verifier = JwtVerifier::from_pem(PUBLIC_KEY, None, None).unwrap();
        let auth = Authenticator::new(Some(verifier), Some(tokens));

        let jwt = sign(&json!({ "sub": "user_123", "exp": in_an_hour() }));
        assert_eq!(auth.authenticate(&jwt).await.unwrap().subject, "user_123");
        assert!(auth.authenticate(&issued.secret).await.is_ok());
    }

    #[tokio::test]
    async fn disabled_api_tokens_are_refused() {
        let tokens = token_service().await;
        let issued = tokens.issue("ci", "user-1").await.unwrap();

        let config = AuthConfig {
            jwt_public_key_pem: Some(PUBLIC_KEY.to_string()),
            allow_api_tokens: false,
            ..AuthConfig::default()
        };
        let auth = Authenticator::from_config(&config, tokens).unwrap();

        assert!(matches!(
            auth.authenticate(&issued.secret).await,
            Err(AuthError::InvalidCredential(_))
        ));
    }
}
