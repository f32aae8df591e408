//! Request authentication boundary.
//!
//! Combines signature verification and token validation into one decision:
//!
//! - [`AuthDecision::Rejected`]: the sender could not be shown to be the
//!   voice platform. No payload parsing happened beyond what the reason
//!   names, and no spoken reply is produced.
//! - [`AuthDecision::Denied`]: the platform is genuine but the user's
//!   credential is missing or invalid. The caller speaks the denial so the
//!   conversation continues.
//! - [`AuthDecision::Authenticated`]: both checks passed.

use crate::auth::location::parse_certificate_url;
use crate::auth::principal::{BearerToken, ValidatedPrincipal};
use crate::auth::signature::SignatureVerifier;
use crate::auth::token::{TokenError, TokenValidator};
use crate::observability::metrics::record_skill_request;
use crate::skill::SkillRequest;
use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use common::secret::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Header carrying the signing certificate URL.
pub const CERT_CHAIN_URL_HEADER: &str = "SignatureCertChainUrl";

/// Header carrying the base64 request signature.
pub const SIGNATURE_HEADER: &str = "Signature";

/// Largest accepted gap between the request timestamp and now.
pub const MAX_TIMESTAMP_TOLERANCE_SECONDS: i64 = 150;

/// Why a request was rejected at the transport level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingHeaders,
    EmptyBody,
    SignatureInvalid,
    MalformedPayload,
    StaleTimestamp,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingHeaders => "missing_headers",
            RejectReason::EmptyBody => "empty_body",
            RejectReason::SignatureInvalid => "signature_invalid",
            RejectReason::MalformedPayload => "malformed_payload",
            RejectReason::StaleTimestamp => "stale_timestamp",
        }
    }
}

/// Why an authentic request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    MissingSessionToken,
    MissingDebugCredential,
    TokenInvalid,
    MissingIdentity,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::MissingSessionToken => "missing_session_token",
            DenialReason::MissingDebugCredential => "missing_debug_credential",
            DenialReason::TokenInvalid => "token_invalid",
            DenialReason::MissingIdentity => "missing_identity",
        }
    }

    /// Text spoken back to the user.
    pub fn speech(&self) -> &'static str {
        match self {
            DenialReason::MissingSessionToken => "There was a problem with authentication",
            DenialReason::MissingDebugCredential => {
                "In debug mode you must include a PAT token in the basic authorization header"
            }
            DenialReason::TokenInvalid => {
                "There was a problem with validating your authentication information"
            }
            DenialReason::MissingIdentity => "There was a problem identifying the account user",
        }
    }
}

/// A request that passed both checks.
#[derive(Debug)]
pub struct AuthenticatedRequest {
    pub principal: ValidatedPrincipal,
    pub token: BearerToken,
    pub request: SkillRequest,
}

/// Outcome of authenticating one webhook call.
#[derive(Debug)]
pub enum AuthDecision {
    Rejected(RejectReason),
    Denied(DenialReason),
    Authenticated(Box<AuthenticatedRequest>),
}

impl AuthDecision {
    /// Bounded label for metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AuthDecision::Rejected(_) => "rejected",
            AuthDecision::Denied(_) => "denied",
            AuthDecision::Authenticated(_) => "authenticated",
        }
    }
}

/// Authenticates webhook calls: platform signature first, then the user's
/// bearer token.
pub struct RequestAuthenticator {
    verifier: SignatureVerifier,
    validator: TokenValidator,
    timestamp_tolerance_seconds: i64,
    debug_pat_auth: bool,
}

impl RequestAuthenticator {
    pub fn new(verifier: SignatureVerifier, validator: TokenValidator) -> Self {
        Self {
            verifier,
            validator,
            timestamp_tolerance_seconds: MAX_TIMESTAMP_TOLERANCE_SECONDS,
            debug_pat_auth: false,
        }
    }

    /// Tighten the timestamp tolerance. Values are clamped to
    /// `1..=MAX_TIMESTAMP_TOLERANCE_SECONDS`.
    #[must_use]
    pub fn with_timestamp_tolerance(mut self, seconds: i64) -> Self {
        self.timestamp_tolerance_seconds = seconds.clamp(1, MAX_TIMESTAMP_TOLERANCE_SECONDS);
        self
    }

    /// Take the credential from `Authorization: Basic` instead of the
    /// session. For local testing only.
    #[must_use]
    pub fn with_debug_pat_auth(mut self, enabled: bool) -> Self {
        self.debug_pat_auth = enabled;
        self
    }

    /// Authenticate one call from its headers and exact body bytes.
    #[instrument(skip_all)]
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        body: &[u8],
        cancel: &CancellationToken,
    ) -> AuthDecision {
        let decision = self.decide(headers, body, Utc::now(), cancel).await;

        match &decision {
            AuthDecision::Rejected(reason) => {
                tracing::warn!(target: "gate.auth.request", reason = reason.as_str(), "Request rejected");
            }
            AuthDecision::Denied(reason) => {
                tracing::info!(target: "gate.auth.request", reason = reason.as_str(), "Request denied");
            }
            AuthDecision::Authenticated(_) => {
                tracing::debug!(target: "gate.auth.request", "Request authenticated");
            }
        }
        record_skill_request(decision.as_label());

        decision
    }

    async fn decide(
        &self,
        headers: &HeaderMap,
        body: &[u8],
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AuthDecision {
        let (Some(cert_chain_url), Some(signature)) = (
            header_value(headers, CERT_CHAIN_URL_HEADER),
            header_value(headers, SIGNATURE_HEADER),
        ) else {
            return AuthDecision::Rejected(RejectReason::MissingHeaders);
        };

        if parse_certificate_url(cert_chain_url).is_none() {
            return AuthDecision::Rejected(RejectReason::SignatureInvalid);
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return AuthDecision::Rejected(RejectReason::EmptyBody);
        }

        if !self
            .verifier
            .verify(signature, cert_chain_url, body, cancel)
            .await
        {
            return AuthDecision::Rejected(RejectReason::SignatureInvalid);
        }

        let Ok(request) = SkillRequest::parse(body) else {
            return AuthDecision::Rejected(RejectReason::MalformedPayload);
        };

        if !self.timestamp_is_fresh(request.timestamp(), now) {
            return AuthDecision::Rejected(RejectReason::StaleTimestamp);
        }

        let token = if self.debug_pat_auth {
            match basic_credential(headers) {
                Some(value) => BearerToken::new(BearerToken::BASIC, value),
                None => return AuthDecision::Denied(DenialReason::MissingDebugCredential),
            }
        } else {
            match request.access_token() {
                Some(value) => BearerToken::new(BearerToken::BEARER, value.clone()),
                None => return AuthDecision::Denied(DenialReason::MissingSessionToken),
            }
        };

        match self.validator.validate_detailed(token.expose(), cancel).await.0 {
            Ok(principal) => AuthDecision::Authenticated(Box::new(AuthenticatedRequest {
                principal,
                token,
                request,
            })),
            Err(TokenError::MissingIdentity) => {
                AuthDecision::Denied(DenialReason::MissingIdentity)
            }
            Err(_) => AuthDecision::Denied(DenialReason::TokenInvalid),
        }
    }

    fn timestamp_is_fresh(&self, timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        timestamp.is_some_and(|ts| {
            (now - ts).num_seconds().abs() <= self.timestamp_tolerance_seconds
        })
    }
}

/// Non-blank header value.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Credential from `Authorization: Basic <token>`.
fn basic_credential(headers: &HeaderMap) -> Option<SecretString> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credential) = value.trim().split_once(' ')?;
    let credential = credential.trim();
    if !scheme.eq_ignore_ascii_case("basic") || credential.is_empty() {
        return None;
    }
    Some(SecretString::from(credential.to_string()))
}
