//! Liveness probe.

/// Returns "OK" while the process is serving. Does not touch the certificate
/// host or the identity provider.
pub async fn health_check() -> &'static str {
    "OK"
}
