//! Signing certificate retrieval and parsing.
//!
//! The platform publishes its request-signing certificate as a PEM bundle:
//! the leaf first, then the intermediates needed to reach a public root. A
//! bare DER certificate is accepted too.
//!
//! The store does not check where the URL points. Callers run the
//! trusted-location check first so forged URLs never cause a fetch.

use crate::auth::http::{build_client, fetch_bytes};
use crate::observability::metrics::record_certificate_fetch;
use async_trait::async_trait;
use common::error::SkillGateError;
use reqwest::Url;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use x509_parser::pem::Pem;
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

/// Largest certificate bundle accepted from the network (64 KiB).
pub const MAX_CERTIFICATE_BYTES: usize = 64 * 1024;

/// Errors from fetching or parsing a certificate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CertificateFetchError {
    #[error("Certificate download failed: {0}")]
    Download(String),

    #[error("Certificate download cancelled")]
    Cancelled,

    #[error("Malformed certificate: {0}")]
    Malformed(String),
}

impl CertificateFetchError {
    /// Bounded label for metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CertificateFetchError::Download(_) => "error",
            CertificateFetchError::Cancelled => "cancelled",
            CertificateFetchError::Malformed(_) => "malformed",
        }
    }
}

impl From<SkillGateError> for CertificateFetchError {
    fn from(err: SkillGateError) -> Self {
        match err {
            SkillGateError::Cancelled(_) => CertificateFetchError::Cancelled,
            other => CertificateFetchError::Download(other.to_string()),
        }
    }
}

/// A parsed X.509 signing certificate and the intermediates shipped with it.
///
/// Only owned data is kept; the chain builder re-parses the DER when it needs
/// the full structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    intermediates: Vec<Vec<u8>>,
    not_before: i64,
    not_after: i64,
    common_name: Option<String>,
    rsa_public_key: Option<Vec<u8>>,
}

impl Certificate {
    /// Parse a PEM bundle or a single DER certificate.
    pub fn parse(bytes: &[u8]) -> Result<Self, CertificateFetchError> {
        if looks_like_pem(bytes) {
            Self::from_pem_bundle(bytes)
        } else {
            Self::from_der(bytes.to_vec(), Vec::new())
        }
    }

    /// Parse a PEM bundle. The first `CERTIFICATE` block is the leaf.
    pub fn from_pem_bundle(bytes: &[u8]) -> Result<Self, CertificateFetchError> {
        let mut blocks = Vec::new();
        for pem in Pem::iter_from_buffer(bytes) {
            let pem = pem
                .map_err(|e| CertificateFetchError::Malformed(format!("Invalid PEM block: {e}")))?;
            if pem.label == "CERTIFICATE" {
                blocks.push(pem.contents);
            }
        }

        let mut blocks = blocks.into_iter();
        let leaf = blocks.next().ok_or_else(|| {
            CertificateFetchError::Malformed("PEM bundle contains no certificate".to_string())
        })?;
        Self::from_der(leaf, blocks.collect())
    }

    /// Parse a DER leaf plus DER intermediates.
    pub fn from_der(
        der: Vec<u8>,
        intermediates: Vec<Vec<u8>>,
    ) -> Result<Self, CertificateFetchError> {
        let (not_before, not_after, common_name, rsa_public_key) = {
            let cert = parse_complete(&der)?;
            let validity = cert.validity();

            let common_name = cert
                .subject()
                .iter_common_name()
                .next()
                .and_then(|cn| cn.as_str().ok())
                .map(ToString::to_string);

            let spki = cert.public_key();
            let rsa_public_key = match spki.parsed() {
                Ok(PublicKey::RSA(_)) => Some(spki.subject_public_key.data.to_vec()),
                _ => None,
            };

            (
                validity.not_before.timestamp(),
                validity.not_after.timestamp(),
                common_name,
                rsa_public_key,
            )
        };

        for intermediate in &intermediates {
            parse_complete(intermediate)?;
        }

        Ok(Self {
            der,
            intermediates,
            not_before,
            not_after,
            common_name,
            rsa_public_key,
        })
    }

    /// Leaf certificate DER.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Intermediate certificates shipped with the leaf, in bundle order.
    pub fn intermediates(&self) -> &[Vec<u8>] {
        &self.intermediates
    }

    /// `notBefore` as Unix seconds.
    pub fn not_before(&self) -> i64 {
        self.not_before
    }

    /// `notAfter` as Unix seconds.
    pub fn not_after(&self) -> i64 {
        self.not_after
    }

    /// First subject common name, if any.
    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    /// PKCS#1 `RSAPublicKey` DER when the subject key is RSA.
    pub fn rsa_public_key(&self) -> Option<&[u8]> {
        self.rsa_public_key.as_deref()
    }

    /// True when `now` lies strictly between `notBefore` and `notAfter`.
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.not_before < now && now < self.not_after
    }
}

/// Parse a DER certificate, rejecting trailing bytes.
pub(crate) fn parse_complete(der: &[u8]) -> Result<X509Certificate<'_>, CertificateFetchError> {
    let (remaining, cert) = parse_x509_certificate(der)
        .map_err(|e| CertificateFetchError::Malformed(format!("Certificate parsing failed: {e}")))?;
    if !remaining.is_empty() {
        return Err(CertificateFetchError::Malformed(
            "Certificate contains trailing data".to_string(),
        ));
    }
    Ok(cert)
}

fn looks_like_pem(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes
        .get(start..)
        .is_some_and(|rest| rest.starts_with(b"-----BEGIN"))
}

/// Source of signing certificates.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Fetch and parse the certificate at `url`.
    async fn fetch(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<Arc<Certificate>, CertificateFetchError>;
}

/// Fetches certificates over HTTPS on every call.
pub struct HttpCertificateStore {
    http_client: reqwest::Client,
}

impl HttpCertificateStore {
    /// Create a store whose fetches time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `SkillGateError::Transport` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, SkillGateError> {
        Ok(Self {
            http_client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl CertificateStore for HttpCertificateStore {
    #[instrument(skip_all, fields(path = %url.path()))]
    async fn fetch(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<Arc<Certificate>, CertificateFetchError> {
        let start = Instant::now();
        let result = fetch_bytes(&self.http_client, url, MAX_CERTIFICATE_BYTES, cancel)
            .await
            .map_err(CertificateFetchError::from)
            .and_then(|bytes| Certificate::parse(&bytes));

        match &result {
            Ok(cert) => {
                tracing::debug!(
                    target: "gate.auth.cert",
                    intermediates = cert.intermediates().len(),
                    "Signing certificate fetched"
                );
                record_certificate_fetch("success", start.elapsed());
            }
            Err(e) => {
                tracing::warn!(target: "gate.auth.cert", error = %e, "Signing certificate fetch failed");
                record_certificate_fetch(e.as_label(), start.elapsed());
            }
        }

        result.map(Arc::new)
    }
}

/// Mock certificate stores for testing.
///
/// Used by the verifier tests, where the certificate URL must point at the
/// real platform host and cannot be served by a local mock server.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that returns a fixed outcome and counts calls.
    pub struct StaticCertificateStore {
        outcome: Result<Arc<Certificate>, CertificateFetchError>,
        call_count: AtomicUsize,
    }

    impl StaticCertificateStore {
        /// Always return `certificate`.
        pub fn serving(certificate: Certificate) -> Self {
            Self {
                outcome: Ok(Arc::new(certificate)),
                call_count: AtomicUsize::new(0),
            }
        }

        /// Always fail with `error`.
        pub fn failing(error: CertificateFetchError) -> Self {
            Self {
                outcome: Err(error),
                call_count: AtomicUsize::new(0),
            }
        }

        /// Number of fetches made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CertificateStore for StaticCertificateStore {
        async fn fetch(
            &self,
            _url: &Url,
            cancel: &CancellationToken,
        ) -> Result<Arc<Certificate>, CertificateFetchError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if cancel.is_cancelled() {
                return Err(CertificateFetchError::Cancelled);
            }
            self.outcome.clone()
        }
    }
}
