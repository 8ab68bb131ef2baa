//! Domain types for the feature flag engine and the token issuer.
//!
//! Identifiers are opaque strings assigned by the store; they are wrapped in
//! newtypes so a token id can never be passed where a feature id is expected.

mod error;
mod feature;
pub mod repository;
mod token;

pub use error::DomainError;
pub use feature::{Feature, FeatureInput, FlagValue};
pub use repository::{FeatureRepository, TokenRepository};
pub use token::{ApiToken, IssuedToken, NewApiToken};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a feature flag.
///
/// # Examples
///
/// ```rust
/// use flagd::domain::FeatureId;
///
/// let id = FeatureId::from("3f1c".to_string());
/// assert_eq!(id.as_str(), "3f1c");
/// assert_eq!(id.to_string(), "3f1c");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FeatureId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<FeatureId> for String {
    fn from(id: FeatureId) -> Self {
        id.0
    }
}

/// Unique identifier of an API token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TokenId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<TokenId> for String {
    fn from(id: TokenId) -> Self {
        id.0
    }
}
