//! Metrics definitions for Skill Gate.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gate_` prefix for Skill Gate
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: 4 values (known paths plus `/other`)
//! - `status`: 3-4 values (success, error, timeout, cancelled/malformed)
//! - `outcome`: bounded by `SignatureError` / `TokenError` labels
//! - `decision`: 3 values (rejected, denied, authenticated)
//! - `attempts`: 1 or 2

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded. Configures histogram
/// buckets for request latency and the two outbound fetches.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Webhook latency; the platform times out after a few seconds
        .set_buckets_for_metric(
            Matcher::Prefix("gate_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("gate_certificate_fetch".to_string()),
            &[0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000],
        )
        .map_err(|e| format!("Failed to set certificate fetch buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("gate_discovery_refresh".to_string()),
            &[0.010, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000],
        )
        .map_err(|e| format!("Failed to set discovery refresh buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `gate_http_requests_total`, `gate_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures framework-level responses (404, 405, 413) as well as handler
/// responses.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("gate_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("gate_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/api/v1/skill" => "/api/v1/skill",
        _ => "/other",
    }
}

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record a signing certificate fetch
///
/// Metric: `gate_certificate_fetch_total`, `gate_certificate_fetch_duration_seconds`
/// Labels: `status` (success, error, cancelled, malformed)
pub fn record_certificate_fetch(status: &str, duration: Duration) {
    histogram!("gate_certificate_fetch_duration_seconds",
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("gate_certificate_fetch_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a request signature verification
///
/// Metric: `gate_signature_verifications_total`
/// Labels: `outcome` (success or a `SignatureError` label)
pub fn record_signature_verification(outcome: &str) {
    counter!("gate_signature_verifications_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a discovery document and signing key refresh
///
/// Metric: `gate_discovery_refresh_total`, `gate_discovery_refresh_duration_seconds`
/// Labels: `status` (success, error, cancelled)
pub fn record_discovery_refresh(status: &str, duration: Duration) {
    histogram!("gate_discovery_refresh_duration_seconds",
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("gate_discovery_refresh_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a bearer token validation
///
/// Metric: `gate_token_validations_total`
/// Labels: `outcome` (success or a `TokenError` label), `attempts`
pub fn record_token_validation(outcome: &str, attempts: u32) {
    counter!("gate_token_validations_total",
        "outcome" => outcome.to_string(),
        "attempts" => attempts.to_string()
    )
    .increment(1);
}

// ============================================================================
// Skill Request Metrics
// ============================================================================

/// Record the authentication decision for a skill request
///
/// Metric: `gate_skill_requests_total`
/// Labels: `decision` (rejected, denied, authenticated)
pub fn record_skill_request(decision: &str) {
    counter!("gate_skill_requests_total",
        "decision" => decision.to_string()
    )
    .increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    // These tests execute the recording functions against the global no-op
    // recorder. Values are not inspected.

    #[test]
    fn test_record_http_request() {
        record_http_request("POST", "/api/v1/skill", 200, Duration::from_millis(40));
        record_http_request("POST", "/api/v1/skill", 400, Duration::from_millis(5));
        record_http_request("GET", "/health", 200, Duration::from_millis(1));
        record_http_request("GET", "/unknown", 404, Duration::from_millis(1));
        record_http_request("POST", "/api/v1/skill", 408, Duration::from_secs(30));
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(204), "success");
        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");
        assert_eq!(categorize_status_code(400), "error");
        assert_eq!(categorize_status_code(503), "error");
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/metrics"), "/metrics");
        assert_eq!(normalize_endpoint("/api/v1/skill"), "/api/v1/skill");
        assert_eq!(normalize_endpoint("/api/v1/skill/extra"), "/other");
        assert_eq!(normalize_endpoint("/"), "/other");
    }

    #[test]
    fn test_record_auth_metrics() {
        record_certificate_fetch("success", Duration::from_millis(80));
        record_certificate_fetch("cancelled", Duration::from_millis(3));
        record_signature_verification("success");
        record_signature_verification("signature_mismatch");
        record_discovery_refresh("success", Duration::from_millis(120));
        record_token_validation("success", 2);
        record_token_validation("audience_mismatch", 1);
        record_skill_request("denied");
    }

    #[test]
    fn test_decision_and_attempt_labels_are_recorded() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_skill_request("denied");
            record_skill_request("denied");
            record_token_validation("success", 2);
        });

        let entries = snapshotter.snapshot().into_vec();
        let counter = |name: &str, label: (&str, &str)| {
            entries.iter().find_map(|(key, _, _, value)| {
                let key = key.key();
                let labelled = key
                    .labels()
                    .any(|l| l.key() == label.0 && l.value() == label.1);
                match value {
                    DebugValue::Counter(n) if key.name() == name && labelled => Some(*n),
                    _ => None,
                }
            })
        };

        assert_eq!(
            counter("gate_skill_requests_total", ("decision", "denied")),
            Some(2)
        );
        assert_eq!(
            counter("gate_token_validations_total", ("attempts", "2")),
            Some(1)
        );
    }
}
