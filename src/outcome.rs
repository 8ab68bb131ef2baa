//! The one table mapping operation results to HTTP statuses and gRPC codes.
//!
//! Both adapters classify errors through [`Outcome`], so a request that fails on
//! one transport fails the same way on the other.

use axum::http::StatusCode;
use tracing::error;

use crate::auth::AuthError;
use crate::domain::DomainError;

/// Message returned to callers in place of internal error detail.
pub const INTERNAL_MESSAGE: &str = "An internal error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Ok,
    Deleted,
    InvalidArgument,
    NotFound,
    Unauthenticated,
    Internal,
}

impl Outcome {
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::Created => StatusCode::CREATED,
            Self::Ok => StatusCode::OK,
            Self::Deleted => StatusCode::NO_CONTENT,
            Self::InvalidArgument => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn rpc_code(self) -> tonic::Code {
        match self {
            Self::Created | Self::Ok | Self::Deleted => tonic::Code::Ok,
            Self::InvalidArgument => tonic::Code::InvalidArgument,
            Self::NotFound => tonic::Code::NotFound,
            Self::Unauthenticated => tonic::Code::Unauthenticated,
            Self::Internal => tonic::Code::Internal,
        }
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Created | Self::Ok | Self::Deleted)
    }

    /// Reads an outcome back from a response status. Statuses outside the table give `None`.
    #[must_use]
    pub fn from_http_status(status: StatusCode) -> Option<Self> {
        match status.as_u16() {
            201 => Some(Self::Created),
            204 => Some(Self::Deleted),
            200..=299 => Some(Self::Ok),
            400 => Some(Self::InvalidArgument),
            401 => Some(Self::Unauthenticated),
            404 => Some(Self::NotFound),
            500 => Some(Self::Internal),
            _ => None,
        }
    }

    #[must_use]
    pub const fn from_rpc_code(code: tonic::Code) -> Option<Self> {
        match code {
            tonic::Code::Ok => Some(Self::Ok),
            tonic::Code::InvalidArgument => Some(Self::InvalidArgument),
            tonic::Code::NotFound => Some(Self::NotFound),
            tonic::Code::Unauthenticated => Some(Self::Unauthenticated),
            tonic::Code::Internal => Some(Self::Internal),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Ok => "ok",
            Self::Deleted => "deleted",
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::Unauthenticated => "unauthenticated",
            Self::Internal => "internal",
        }
    }
}

impl From<&DomainError> for Outcome {
    fn from(err: &DomainError) -> Self {
        match err {
            DomainError::Validation(_) => Self::InvalidArgument,
            DomainError::NotFound { .. } => Self::NotFound,
            DomainError::Encoding(_) | DomainError::Database(_) | DomainError::Internal(_) => {
                Self::Internal
            }
        }
    }
}

impl From<&AuthError> for Outcome {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::MissingCredential | AuthError::InvalidCredential(_) => {
                Self::Unauthenticated
            }
            AuthError::Unavailable(_) => Self::Internal,
        }
    }
}

/// Classifies `err` and picks the message safe to show the caller.
///
/// Internal failures are logged here with full detail and replaced by a generic message.
pub fn classify<E>(err: &E) -> (Outcome, String)
where
    E: std::fmt::Display,
    for<'a> Outcome: From<&'a E>,
{
    let outcome = Outcome::from(err);
    let message = if outcome == Outcome::Internal {
        error!("Internal error: {err}");
        INTERNAL_MESSAGE.to_string()
    } else {
        err.to_string()
    };
    (outcome, message)
}
