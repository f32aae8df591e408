//! JWT utilities shared across Skill Gate components.
//!
//! This module provides the pre-verification checks that run before any
//! cryptographic work:
//! - Size limits for DoS prevention
//! - Clock skew constants for lifetime validation
//! - Header inspection (algorithm, key ID, signature presence)
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Unsigned tokens (`alg: none` or an empty signature segment) are flagged
//!   so callers can reject them without consulting a key set
//! - Generic error messages prevent information leakage
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{inspect_header, MAX_JWT_SIZE_BYTES};
//!
//! let header = inspect_header(token)?;
//! if header.is_unsigned() {
//!     return Err(TokenError::Unsigned);
//! }
//! let kid = header.kid.ok_or(TokenError::Malformed)?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this size are rejected BEFORE any parsing or cryptographic
/// operations.
///
/// # Rationale
///
/// - Identity provider access tokens are typically 1-2KB
/// - 8KB limit allows for large group claims while preventing abuse
/// - Checked BEFORE base64 decode and signature verification
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default JWT clock skew tolerance (5 minutes).
///
/// Applied to `exp` and `nbf` checks to absorb clock drift between this
/// service and the identity provider.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Algorithm value that marks a token as unsigned.
pub const UNSIGNED_ALG: &str = "none";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during JWT header inspection.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,
}

// =============================================================================
// Header Types
// =============================================================================

/// The subset of a JWT header needed to pick a verification key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    /// Declared signing algorithm (`alg`).
    pub alg: String,

    /// Key ID (`kid`), if present and non-empty.
    pub kid: Option<String>,

    /// Whether the third (signature) segment is non-empty.
    pub has_signature: bool,
}

impl TokenHeader {
    /// True when the token carries no signature at all.
    #[must_use]
    pub fn is_unsigned(&self) -> bool {
        !self.has_signature || self.alg.eq_ignore_ascii_case(UNSIGNED_ALG)
    }
}

#[derive(Deserialize)]
struct RawHeader {
    #[serde(default)]
    alg: Option<String>,
    #[serde(default)]
    kid: Option<serde_json::Value>,
}

// =============================================================================
// Functions
// =============================================================================

/// Inspect a JWT header without verifying the signature.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing (denial-of-service prevention)
/// - This function does NOT validate the token signature
/// - The returned `kid` should only be used for key lookup in a trusted key set
///
/// # Errors
///
/// Returns `JwtValidationError` variants:
/// - `TokenTooLarge` - Token exceeds size limit
/// - `MalformedToken` - Wrong structure, bad base64, invalid JSON, or no `alg`
pub fn inspect_header(token: &str) -> Result<TokenHeader, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    let (header_part, signature_part) = match parts.as_slice() {
        [header, _payload, signature] => (*header, *signature),
        _ => {
            tracing::debug!(
                target: "common.jwt",
                parts = parts.len(),
                "Token rejected: invalid JWT format"
            );
            return Err(JwtValidationError::MalformedToken);
        }
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let raw: RawHeader = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    let alg = raw.alg.ok_or(JwtValidationError::MalformedToken)?;

    // Non-string and empty kid values are treated as absent
    let kid = raw
        .kid
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string);

    Ok(TokenHeader {
        alg,
        kid,
        has_signature: !signature_part.is_empty(),
    })
}

// =============================================================================
// Tests
// =============================================================================
