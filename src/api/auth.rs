use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::auth::AuthError;
use crate::telemetry;

/// Authenticates the `Authorization: Bearer` credential and hands the resolved
/// [`crate::auth::Principal`] to handlers through request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| {
            AuthError::InvalidCredential("authorization header is not valid ASCII".to_string())
        })?),
        None => None,
    };

    let principal = state.authenticator.authenticate_header(header).await?;

    telemetry::record_principal(&principal.subject);
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}
