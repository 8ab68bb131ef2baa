use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use super::AppState;
use crate::outcome::Outcome;
use crate::telemetry::{self, RequestRecord, Transport};

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || (StatusCode::NOT_FOUND, "Metrics are not enabled".to_string()),
        |handle| (StatusCode::OK, handle.render()),
    )
}

/// Wraps every HTTP request in a request span and records how it finished.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();

    // Unmatched requests share one label instead of their raw path.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |mp| mp.as_str().to_string());

    let span = telemetry::request_span(Transport::Http, &method, &route);

    async move {
        let response = next.run(req).await;
        let status = response.status();

        telemetry::record_finished(&RequestRecord {
            transport: Transport::Http,
            method: &method,
            route: &route,
            status: status.as_u16().to_string(),
            outcome: Outcome::from_http_status(status),
            elapsed: start.elapsed(),
        });

        response
    }
    .instrument(span)
    .await
}
