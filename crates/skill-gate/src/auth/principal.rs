//! Authenticated identity types handed to intent routing.

use common::secret::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::fmt;

/// Identity established by a successfully validated bearer token.
///
/// Only the token validator constructs this type.
#[derive(Clone)]
pub struct ValidatedPrincipal {
    identity_name: String,
    claims: Map<String, Value>,
}

impl ValidatedPrincipal {
    pub(crate) fn new(identity_name: String, claims: Map<String, Value>) -> Self {
        Self {
            identity_name,
            claims,
        }
    }

    /// Account name from the token's name claim.
    pub fn identity_name(&self) -> &str {
        &self.identity_name
    }

    /// Every other claim the token carried.
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// Single claim by name.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }
}

impl fmt::Debug for ValidatedPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedPrincipal")
            .field("identity_name", &"[REDACTED]")
            .field("claims", &self.claims.len())
            .finish()
    }
}

/// Credential the caller presented, kept so downstream calls can act as the
/// user.
#[derive(Debug, Clone)]
pub struct BearerToken {
    scheme: String,
    value: SecretString,
}

impl BearerToken {
    /// Scheme used for session access tokens.
    pub const BEARER: &'static str = "Bearer";

    /// Scheme used for debug personal access tokens.
    pub const BASIC: &'static str = "Basic";

    pub fn new(scheme: &str, value: SecretString) -> Self {
        Self {
            scheme: scheme.to_string(),
            value,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The raw credential. Callers must not log it.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }
}
