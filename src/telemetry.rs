//! Per-request span, wide event and metrics, shared by both listeners.
//!
//! Counters and histograms are named `{transport}_requests_total` and
//! `{transport}_request_duration_seconds`, labelled by method, route, status and outcome.

use std::time::Duration;
use tracing::{Span, info, info_span};
use uuid::Uuid;

use crate::outcome::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Grpc,
}

impl Transport {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Grpc => "grpc",
        }
    }

    const fn requests_total(self) -> &'static str {
        match self {
            Self::Http => "http_requests_total",
            Self::Grpc => "grpc_requests_total",
        }
    }

    const fn request_duration(self) -> &'static str {
        match self {
            Self::Http => "http_request_duration_seconds",
            Self::Grpc => "grpc_request_duration_seconds",
        }
    }
}

/// One finished request, as both listeners describe it.
#[derive(Debug)]
pub struct RequestRecord<'a> {
    pub transport: Transport,
    /// HTTP verb, or the RPC method name.
    pub method: &'a str,
    /// Route template or full RPC path. Never a raw URI, to keep label cardinality bounded.
    pub route: &'a str,
    /// HTTP status number or gRPC code name.
    pub status: String,
    pub outcome: Option<Outcome>,
    pub elapsed: Duration,
}

impl RequestRecord<'_> {
    fn outcome_label(&self) -> &'static str {
        self.outcome.map_or("other", Outcome::as_str)
    }
}

/// Span every log line of one request is nested under.
///
/// `principal` is filled in once authentication succeeds.
#[must_use]
pub fn request_span(transport: Transport, method: &str, route: &str) -> Span {
    info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        transport = transport.as_str(),
        method = %method,
        route = %route,
        principal = tracing::field::Empty,
    )
}

/// Records the principal on the current request span.
pub fn record_principal(subject: &str) {
    Span::current().record("principal", subject);
}

/// Emits the `request_finished` event and updates the request metrics.
///
/// Call inside the request span so the event carries its fields.
pub fn record_finished(record: &RequestRecord<'_>) {
    let outcome = record.outcome_label();
    let labels = [
        ("method", record.method.to_string()),
        ("route", record.route.to_string()),
        ("status", record.status.clone()),
        ("outcome", outcome.to_string()),
    ];

    metrics::counter!(record.transport.requests_total(), &labels).increment(1);
    metrics::histogram!(record.transport.request_duration(), &labels)
        .record(record.elapsed.as_secs_f64());

    let duration_ms = u64::try_from(record.elapsed.as_millis()).unwrap_or(u64::MAX);
    info!(
        event = "request_finished",
        transport = record.transport.as_str(),
        status = %record.status,
        outcome = outcome,
        duration_ms = duration_ms,
        "Request finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    fn render(record: &RequestRecord<'_>) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || record_finished(record));
        handle.render()
    }

    #[test]
    fn grpc_requests_get_counter_and_histogram() {
        let rendered = render(&RequestRecord {
            transport: Transport::Grpc,
            method: "GetFeature",
            route: "/flagd.v1.FeatureService/GetFeature",
            status: "NotFound".to_string(),
            outcome: Some(Outcome::NotFound),
            elapsed: Duration::from_millis(3),
        });

        assert!(rendered.contains("grpc_requests_total{"), "{rendered}");
        assert!(rendered.contains("grpc_request_duration_seconds"), "{rendered}");
        assert!(rendered.contains(r#"outcome="not_found""#), "{rendered}");
        assert!(rendered.contains(r#"method="GetFeature""#), "{rendered}");
        assert!(!rendered.contains("http_requests_total"), "{rendered}");
    }

    #[test]
    fn statuses_outside_the_outcome_table_are_other() {
        let rendered = render(&RequestRecord {
            transport: Transport::Http,
            method: "GET",
            route: "/api/features",
            status: "408".to_string(),
            outcome: None,
            elapsed: Duration::from_secs(30),
        });

        assert!(rendered.contains("http_requests_total{"), "{rendered}");
        assert!(rendered.contains(r#"outcome="other""#), "{rendered}");
        assert!(rendered.contains(r#"status="408""#), "{rendered}");
    }
}
