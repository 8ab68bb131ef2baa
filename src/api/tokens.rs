use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::{ApiError, AppState, IssueTokenRequest, IssuedTokenDto, JsonBody, TokenDto};
use crate::auth::Principal;
use crate::domain::TokenId;

/// POST /tokens
///
/// The secret in the response is never retrievable again.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    JsonBody(payload): JsonBody<IssueTokenRequest>,
) -> Result<(StatusCode, Json<IssuedTokenDto>), ApiError> {
    let issued = state
        .token_service
        .issue(&payload.name, &principal.subject)
        .await?;
    Ok((StatusCode::CREATED, Json(issued.into())))
}

/// GET /tokens
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TokenDto>>, ApiError> {
    let tokens = state.token_service.list().await?;
    Ok(Json(tokens.into_iter().map(TokenDto::from).collect()))
}

/// DELETE /tokens/{id}
pub async fn revoke_token(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.token_service.revoke(&TokenId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
