//! Request signature verification.
//!
//! The voice platform signs every webhook body with the private key of a
//! certificate it publishes under a fixed location. Verification runs as an
//! ordered pipeline where the first failing step decides the outcome:
//!
//! 1. Certificate URL is inside the trusted location (no network on failure)
//! 2. Certificate is fetched and parsed
//! 3. Certificate is inside its validity window and names the platform
//! 4. Certificate chains to a trust anchor (revocation not checked)
//! 5. RSA PKCS#1 v1.5 / SHA-1 signature over the exact body bytes
//!
//! # Security
//!
//! - SHA-1 is mandated by the platform's signing protocol and cannot be
//!   negotiated. It is used here only for this legacy signature.
//! - The failure kind is logged and counted but never returned to callers;
//!   [`SignatureVerifier::verify`] collapses it to `false`.

use crate::auth::certificate::{CertificateFetchError, CertificateStore};
use crate::auth::location::{check_certificate_location, parse_certificate_url};
use crate::auth::trust::{ChainError, RevocationMode, TrustAnchors};
use crate::observability::metrics::record_signature_verification;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use ring::signature::{UnparsedPublicKey, RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Subject common name the platform's signing certificate must carry.
pub const EXPECTED_COMMON_NAME: &str = "echo-api.amazon.com";

/// Why a request signature was not accepted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Certificate URL outside trusted location: {0}")]
    InvalidCertificateLocation(&'static str),

    #[error(transparent)]
    CertificateFetch(#[from] CertificateFetchError),

    #[error("Certificate is expired or not yet valid")]
    CertificateExpiredOrNotYetValid,

    #[error("Certificate subject does not identify the platform")]
    CertificateIdentityMismatch,

    #[error("Certificate chain build failed: {0}")]
    ChainBuildFailure(#[from] ChainError),

    #[error("Signature does not match request body")]
    SignatureMismatch,
}

impl SignatureError {
    /// Bounded label for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SignatureError::InvalidCertificateLocation(_) => "invalid_location",
            SignatureError::CertificateFetch(_) => "certificate_fetch",
            SignatureError::CertificateExpiredOrNotYetValid => "certificate_expired",
            SignatureError::CertificateIdentityMismatch => "identity_mismatch",
            SignatureError::ChainBuildFailure(_) => "chain_build",
            SignatureError::SignatureMismatch => "signature_mismatch",
        }
    }
}

/// Verifies that a request body was signed by the voice platform.
pub struct SignatureVerifier {
    store: Arc<dyn CertificateStore>,
    anchors: Arc<TrustAnchors>,
    revocation: RevocationMode,
}

impl SignatureVerifier {
    pub fn new(
        store: Arc<dyn CertificateStore>,
        anchors: Arc<TrustAnchors>,
        revocation: RevocationMode,
    ) -> Self {
        Self {
            store,
            anchors,
            revocation,
        }
    }

    /// Verify `signature_b64` over `raw_body` using the certificate at
    /// `cert_chain_url`.
    ///
    /// Returns `true` only when every step passes.
    #[instrument(skip_all)]
    pub async fn verify(
        &self,
        signature_b64: &str,
        cert_chain_url: &str,
        raw_body: &[u8],
        cancel: &CancellationToken,
    ) -> bool {
        let now = Utc::now().timestamp();
        match self
            .check(signature_b64, cert_chain_url, raw_body, now, cancel)
            .await
        {
            Ok(()) => {
                tracing::debug!(target: "gate.auth.signature", "Request signature verified");
                record_signature_verification("success");
                true
            }
            Err(e) => {
                tracing::warn!(
                    target: "gate.auth.signature",
                    kind = e.as_label(),
                    error = %e,
                    "Request signature rejected"
                );
                record_signature_verification(e.as_label());
                false
            }
        }
    }

    /// Run the verification pipeline at time `now` (Unix seconds).
    pub async fn check(
        &self,
        signature_b64: &str,
        cert_chain_url: &str,
        raw_body: &[u8],
        now: i64,
        cancel: &CancellationToken,
    ) -> Result<(), SignatureError> {
        let url = parse_certificate_url(cert_chain_url)
            .ok_or(SignatureError::InvalidCertificateLocation("unparsable"))?;
        check_certificate_location(&url)
            .map_err(|v| SignatureError::InvalidCertificateLocation(v.as_str()))?;

        let cert = self.store.fetch(&url, cancel).await?;

        if !cert.is_valid_at(now) {
            return Err(SignatureError::CertificateExpiredOrNotYetValid);
        }
        if cert.common_name() != Some(EXPECTED_COMMON_NAME) {
            return Err(SignatureError::CertificateIdentityMismatch);
        }

        let depth = self.anchors.build_chain(&cert, now, self.revocation)?;
        tracing::debug!(target: "gate.auth.signature", depth, "Certificate chain built");

        let signature = STANDARD
            .decode(signature_b64.trim())
            .map_err(|_| SignatureError::SignatureMismatch)?;
        let public_key = cert
            .rsa_public_key()
            .ok_or(SignatureError::SignatureMismatch)?;

        UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY, public_key)
            .verify(raw_body, &signature)
            .map_err(|_| SignatureError::SignatureMismatch)
    }
}
