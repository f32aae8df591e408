//! Mock certificate host
//!
//! Serves certificate bundles from a `wiremock` server so the HTTP certificate
//! store can be exercised without reaching the real platform bucket.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the bundle is served under.
pub const CERT_PATH: &str = "/echo.api/echo-api-cert.pem";

/// Mock HTTP host for certificate bundles.
pub struct MockCertificateHost {
    server: MockServer,
}

impl MockCertificateHost {
    /// Start a host serving `pem` at [`CERT_PATH`].
    pub async fn serving(pem: &str) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CERT_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/x-pem-file")
                    .set_body_string(pem.to_string()),
            )
            .mount(&server)
            .await;
        Self { server }
    }

    /// Start a host that answers every request with `status`.
    pub async fn failing(status: u16) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Start a host that answers after `delay`.
    pub async fn slow(pem: &str, delay: std::time::Duration) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(pem.to_string())
                    .set_delay(delay),
            )
            .mount(&server)
            .await;
        Self { server }
    }

    /// Full URL of the served bundle.
    pub fn url(&self) -> String {
        format!("{}{}", self.server.uri(), CERT_PATH)
    }

    /// Number of requests received.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or_default()
    }
}
