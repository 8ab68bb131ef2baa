//! Error taxonomy shared by the repositories, the services and both adapters.

use thiserror::Error;

/// Closed set of failures a feature or token operation can produce.
///
/// Adapters map every variant exhaustively through [`crate::outcome::Outcome`],
/// so adding a variant here forces both transports to decide how to report it.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Client-supplied data violates an invariant (e.g. an empty required field).
    #[error("{0}")]
    Validation(String),

    /// The referenced id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The value codec was handed something it cannot represent.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn feature_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "feature",
            id: id.into(),
        }
    }

    pub fn token_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "token",
            id: id.into(),
        }
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for DomainError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
