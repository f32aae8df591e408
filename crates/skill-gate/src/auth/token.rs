//! Bearer token validation.
//!
//! Access tokens are RS256 JWTs from a single fixed issuer and audience.
//! Validation runs against the signing keys in the [`DiscoveryCache`]. When a
//! token names a key the cache does not hold, the provider has probably
//! rotated keys: the cache is invalidated and validation runs once more.
//! A key set fetched after validation began is already fresh and is not
//! invalidated again.
//! Every other failure is final.
//!
//! # Security
//!
//! - Header checks (size, structure, `alg`, `kid`) run before any key lookup
//! - Unsigned tokens are rejected without consulting the key set
//! - At most [`MAX_ATTEMPTS`] key-set lookups per token
//! - Token contents and identity names are never logged

use crate::auth::discovery::{DiscoveryCache, SigningKeySet};
use crate::auth::principal::ValidatedPrincipal;
use crate::observability::metrics::record_token_validation;
use common::jwt::{inspect_header, DEFAULT_CLOCK_SKEW};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, Validation};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Audience access tokens must be issued for.
pub const AUDIENCE: &str = "499b84ac-1321-427f-aa17-267ca6975798";

/// Key-set lookups per token: the first try plus one after invalidation.
pub const MAX_ATTEMPTS: u32 = 2;

/// Claims that may carry the identity name, in precedence order.
pub const NAME_CLAIMS: [&str; 3] = ["unique_name", "name", "upn"];

/// Why a bearer token was not accepted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is unsigned")]
    Unsigned,

    #[error("Token is malformed")]
    Malformed,

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token issuer does not match")]
    IssuerMismatch,

    #[error("Token audience does not match")]
    AudienceMismatch,

    /// Outside its lifetime, including a `nbf` in the future.
    #[error("Token is expired or not yet valid")]
    Expired,

    #[error("Token signing key not found")]
    KeyNotFound,

    #[error("Token carries no identity name")]
    MissingIdentity,

    #[error("Signing keys unavailable")]
    DiscoveryUnavailable,
}

impl TokenError {
    /// Bounded label for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TokenError::Unsigned => "unsigned",
            TokenError::Malformed => "malformed",
            TokenError::SignatureInvalid => "signature_invalid",
            TokenError::IssuerMismatch => "issuer_mismatch",
            TokenError::AudienceMismatch => "audience_mismatch",
            TokenError::Expired => "expired",
            TokenError::KeyNotFound => "key_not_found",
            TokenError::MissingIdentity => "missing_identity",
            TokenError::DiscoveryUnavailable => "discovery_unavailable",
        }
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::SignatureInvalid,
        ErrorKind::InvalidIssuer => TokenError::IssuerMismatch,
        ErrorKind::InvalidAudience => TokenError::AudienceMismatch,
        ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => TokenError::Expired,
        ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "iss" => TokenError::IssuerMismatch,
            "aud" => TokenError::AudienceMismatch,
            "exp" => TokenError::Expired,
            _ => TokenError::Malformed,
        },
        _ => TokenError::Malformed,
    }
}

/// Validates access tokens against the provider's current signing keys.
pub struct TokenValidator {
    discovery: Arc<DiscoveryCache>,
    audience: String,
    leeway_seconds: u64,
}

impl TokenValidator {
    /// Validator for the gate's fixed audience, with the issuer the
    /// discovery cache serves.
    pub fn new(discovery: Arc<DiscoveryCache>) -> Self {
        Self {
            discovery,
            audience: AUDIENCE.to_string(),
            leeway_seconds: DEFAULT_CLOCK_SKEW.as_secs(),
        }
    }

    /// Validate `token`, returning the principal or `None`.
    pub async fn validate(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Option<ValidatedPrincipal> {
        self.validate_detailed(token, cancel).await.0.ok()
    }

    /// Validate `token`, returning the classified outcome and the number of
    /// key-set attempts used.
    #[instrument(skip_all)]
    pub async fn validate_detailed(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> (Result<ValidatedPrincipal, TokenError>, u32) {
        let (result, attempts) = self.run(token, cancel).await;

        match &result {
            Ok(_) => {
                tracing::debug!(target: "gate.auth.token", attempts, "Token validated");
                record_token_validation("success", attempts);
            }
            Err(e) => {
                tracing::warn!(
                    target: "gate.auth.token",
                    kind = e.as_label(),
                    attempts,
                    "Token rejected"
                );
                record_token_validation(e.as_label(), attempts);
            }
        }

        (result, attempts)
    }

    async fn run(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> (Result<ValidatedPrincipal, TokenError>, u32) {
        let started = Instant::now();
        let kid = match precheck(token) {
            Ok(kid) => kid,
            Err(e) => return (Err(e), 1),
        };

        let mut attempts = 0;
        loop {
            attempts += 1;

            let keys = match self.discovery.get(cancel).await {
                Ok(keys) => keys,
                Err(e) => {
                    tracing::warn!(target: "gate.auth.token", error = %e, "Signing keys unavailable");
                    return (Err(TokenError::DiscoveryUnavailable), attempts);
                }
            };

            match self.verify(token, &kid, &keys) {
                Err(TokenError::KeyNotFound) if attempts < MAX_ATTEMPTS => {
                    let invalidated = self.discovery.invalidate_if_fetched_before(started).await;
                    tracing::info!(
                        target: "gate.auth.token",
                        invalidated,
                        "Token signing key not cached, refreshing signing keys"
                    );
                }
                outcome => return (outcome, attempts),
            }
        }
    }

    fn verify(
        &self,
        token: &str,
        kid: &str,
        keys: &SigningKeySet,
    ) -> Result<ValidatedPrincipal, TokenError> {
        let key = keys.get(kid).ok_or(TokenError::KeyNotFound)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.discovery.issuer()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_nbf = true;
        validation.leeway = self.leeway_seconds;

        let data = decode::<Map<String, Value>>(token, key, &validation)
            .map_err(|e| classify(e.kind()))?;

        principal_from_claims(data.claims)
    }
}

/// Header checks that need no key material. Returns the `kid`.
fn precheck(token: &str) -> Result<String, TokenError> {
    let header = inspect_header(token).map_err(|_| TokenError::Malformed)?;
    if header.is_unsigned() {
        return Err(TokenError::Unsigned);
    }
    if header.alg != "RS256" {
        return Err(TokenError::SignatureInvalid);
    }
    header.kid.ok_or(TokenError::Malformed)
}

/// Split the identity name out of the claims.
fn principal_from_claims(
    mut claims: Map<String, Value>,
) -> Result<ValidatedPrincipal, TokenError> {
    let name_claim = NAME_CLAIMS
        .iter()
        .find(|claim| {
            claims
                .get(**claim)
                .and_then(Value::as_str)
                .is_some_and(|v| !v.trim().is_empty())
        })
        .ok_or(TokenError::MissingIdentity)?;

    let identity_name = claims
        .remove(*name_claim)
        .and_then(|v| v.as_str().map(|s| s.trim().to_string()))
        .ok_or(TokenError::MissingIdentity)?;

    Ok(ValidatedPrincipal::new(identity_name, claims))
}
