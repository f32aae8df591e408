//! Prometheus metrics endpoint handler.
//!
//! The endpoint is unauthenticated. Labels are bounded and carry no request
//! content, tokens or user identity.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus text format:
/// ```text
/// # TYPE gate_skill_requests_total counter
/// gate_skill_requests_total{decision="authenticated"} 42
/// ```
#[tracing::instrument(skip_all, name = "gate.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

