use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::domain::DomainError;
use crate::outcome::{self, Outcome};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Domain(e) => Outcome::from(e),
            Self::Auth(e) => Outcome::from(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (outcome, message) = match &self {
            Self::Domain(e) => outcome::classify(e),
            Self::Auth(e) => outcome::classify(e),
        };

        (outcome.http_status(), Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_carries_its_message() {
        let (status, body) = render(DomainError::feature_not_found("f-1").into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "feature not found: f-1");
    }

    #[tokio::test]
    async fn database_errors_are_generic() {
        let (status, body) = render(DomainError::Database("locked".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], outcome::INTERNAL_MESSAGE);
    }

    #[tokio::test]
    async fn missing_credentials_are_401() {
        let (status, _) = render(AuthError::MissingCredential.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
