//! HTTP adapter: JSON over axum, nested under `/api`.

use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::Authenticator;
use crate::config::Config;
use crate::db::Store;
use crate::services::{DefaultFeatureService, DefaultTokenService, FeatureService, TokenService};

pub mod auth;
mod error;
mod extract;
mod features;
mod health;
mod observability;
mod tokens;
mod types;

pub use error::{ApiError, ErrorBody};
pub use extract::JsonBody;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub store: Store,

    pub feature_service: Arc<dyn FeatureService>,

    pub token_service: Arc<dyn TokenService>,

    pub authenticator: Arc<Authenticator>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

/// Wires services and the authenticator over an already migrated store.
pub fn create_app_state(
    config: Config,
    store: Store,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let feature_service: Arc<dyn FeatureService> =
        Arc::new(DefaultFeatureService::new(store.feature_repo()));
    let token_service: Arc<dyn TokenService> =
        Arc::new(DefaultTokenService::new(store.token_repo()));
    let authenticator = Arc::new(Authenticator::from_config(
        &config.auth,
        token_service.clone(),
    )?);

    Ok(Arc::new(AppState {
        config: Arc::new(config),
        store,
        feature_service,
        token_service,
        authenticator,
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    create_app_state(config, store, prometheus_handle)
}

pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;
    let cors_origins = server.cors_allowed_origins.clone();
    let timeout = Duration::from_secs(server.request_timeout_seconds);

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/health", get(health::health))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new().nest("/api", api_router).layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(observability::logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer.allow_methods(Any).allow_headers(Any))
            .layer(timeout_layer(timeout)),
    )
}

/// Requests running past `timeout` are dropped and answered with 408.
#[must_use]
pub fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/features",
            get(features::list_features).post(features::create_feature),
        )
        .route(
            "/features/{id}",
            get(features::get_feature)
                .put(features::update_feature)
                .delete(features::delete_feature),
        )
        .route("/features/{id}/toggle", post(features::toggle_feature))
        .route(
            "/tokens",
            get(tokens::list_tokens).post(tokens::issue_token),
        )
        .route("/tokens/{id}", axum::routing::delete(tokens::revoke_token))
        .route("/metrics", get(observability::get_metrics))
        .layer(middleware::from_fn_with_state(
            state,
            auth::auth_middleware,
        ))
}
