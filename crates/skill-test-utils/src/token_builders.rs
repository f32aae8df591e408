//! Builder patterns for identity-provider access tokens
//!
//! Mints RS256 tokens shaped like the identity provider's v1 access tokens.

use crate::crypto_fixtures::FixtureError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Audience the gate expects on access tokens.
pub const TEST_AUDIENCE: &str = "499b84ac-1321-427f-aa17-267ca6975798";

/// Builder for signed test access tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new(&idp.issuer())
///     .for_user("alice@example.com")
///     .with_kid("key-a")
///     .sign(IDP_KEY_A_PEM)?;
/// ```
pub struct TestTokenBuilder {
    claims: Map<String, Value>,
    kid: Option<String>,
}

impl TestTokenBuilder {
    /// Create a token builder for `issuer` with the expected audience and a
    /// one hour lifetime.
    pub fn new(issuer: &str) -> Self {
        let now = Utc::now();
        let mut claims = Map::new();
        claims.insert("iss".to_string(), json!(issuer));
        claims.insert("aud".to_string(), json!(TEST_AUDIENCE));
        claims.insert("iat".to_string(), json!(now.timestamp()));
        claims.insert("nbf".to_string(), json!(now.timestamp()));
        claims.insert(
            "exp".to_string(),
            json!((now + Duration::seconds(3600)).timestamp()),
        );
        claims.insert("unique_name".to_string(), json!("test.user@example.com"));
        claims.insert("oid".to_string(), json!("00000000-0000-0000-0000-000000000001"));
        claims.insert("scp".to_string(), json!("user_impersonation"));
        Self {
            claims,
            kid: Some("test-key".to_string()),
        }
    }

    /// Set the `unique_name` claim (the identity name).
    pub fn for_user(self, unique_name: &str) -> Self {
        self.with_claim("unique_name", json!(unique_name))
    }

    /// Set the audience.
    pub fn with_audience(self, audience: &str) -> Self {
        self.with_claim("aud", json!(audience))
    }

    /// Set expiration in seconds from now (negative = already expired).
    pub fn expires_in(self, seconds: i64) -> Self {
        let exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self.with_claim("exp", json!(exp))
    }

    /// Set the `kid` header.
    pub fn with_kid(mut self, kid: &str) -> Self {
        self.kid = Some(kid.to_string());
        self
    }

    /// Omit the `kid` header.
    pub fn without_kid(mut self) -> Self {
        self.kid = None;
        self
    }

    /// Set an arbitrary claim.
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    /// Remove a claim.
    pub fn without_claim(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    /// The claims as they will be encoded.
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// Sign with an RSA private key (PKCS#8 PEM) using RS256.
    pub fn sign(self, key_pem: &str) -> Result<String, FixtureError> {
        let key = EncodingKey::from_rsa_pem(key_pem.as_bytes())
            .map_err(|e| FixtureError::Token(e.to_string()))?;
        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = self.kid;
        encode(&header, &self.claims, &key).map_err(|e| FixtureError::Token(e.to_string()))
    }

    /// Encode with `alg: none` and an empty signature segment.
    pub fn unsigned(self) -> String {
        let mut header = json!({ "alg": "none", "typ": "JWT" });
        if let Some(kid) = self.kid {
            header["kid"] = json!(kid);
        }
        let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_b64 = URL_SAFE_NO_PAD.encode(Value::Object(self.claims).to_string());
        format!("{header_b64}.{payload_b64}.")
    }
}
