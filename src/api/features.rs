use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::{
    ApiError, AppState, FeatureDto, FeatureQuery, FeatureRequest, JsonBody, ToggleRequest,
};
use crate::domain::FeatureId;

/// POST /features
pub async fn create_feature(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<FeatureRequest>,
) -> Result<(StatusCode, Json<FeatureDto>), ApiError> {
    let feature = state.feature_service.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(FeatureDto::try_from(feature)?)))
}

/// GET /features?resource_id=
///
/// Filtering by resource happens here, over the full listing.
pub async fn list_features(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeatureQuery>,
) -> Result<Json<Vec<FeatureDto>>, ApiError> {
    let features = state.feature_service.list_all().await?;

    let resource_id = query.resource_id.filter(|r| !r.is_empty());
    let dtos = features
        .into_iter()
        .filter(|f| resource_id.as_deref().is_none_or(|r| f.resource_id == r))
        .map(FeatureDto::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(dtos))
}

/// GET /features/{id}
pub async fn get_feature(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FeatureDto>, ApiError> {
    let feature = state.feature_service.get_by_id(&FeatureId::from(id)).await?;
    Ok(Json(FeatureDto::try_from(feature)?))
}

/// PUT /features/{id}
pub async fn update_feature(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<FeatureRequest>,
) -> Result<Json<FeatureDto>, ApiError> {
    let feature = state
        .feature_service
        .update(&FeatureId::from(id), payload.into())
        .await?;
    Ok(Json(FeatureDto::try_from(feature)?))
}

/// DELETE /features/{id}
pub async fn delete_feature(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.feature_service.delete(&FeatureId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /features/{id}/toggle
pub async fn toggle_feature(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<ToggleRequest>,
) -> Result<Json<FeatureDto>, ApiError> {
    let feature = state
        .feature_service
        .toggle(&FeatureId::from(id), payload.active)
        .await?;
    Ok(Json(FeatureDto::try_from(feature)?))
}
