//! Builders for signed skill requests
//!
//! Produces request bodies shaped like the voice platform's webhook payload
//! and the detached RSA/SHA-1 signature the platform sends alongside them.

use crate::crypto_fixtures::{rsa_private_key, FixtureError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use serde_json::json;
use sha1::Sha1;

/// Sign `body` the way the voice platform does: RSA PKCS#1 v1.5 over SHA-1,
/// base64 (standard alphabet) encoded.
pub fn sign_body(key_pem: &str, body: &[u8]) -> Result<String, FixtureError> {
    let key = rsa_private_key(key_pem)?;
    let signing_key = SigningKey::<Sha1>::new(key);
    let signature = signing_key
        .try_sign(body)
        .map_err(|e| FixtureError::Crypto(format!("Failed to sign body: {e}")))?;
    Ok(STANDARD.encode(signature.to_vec()))
}

/// Builder for skill request payloads.
///
/// # Example
/// ```rust,ignore
/// let body = SkillRequestBuilder::new()
///     .with_access_token(&token)
///     .with_intent("Account")
///     .build();
/// ```
pub struct SkillRequestBuilder {
    access_token: Option<String>,
    intent: Option<String>,
    timestamp: Option<DateTime<Utc>>,
}

impl SkillRequestBuilder {
    /// New intent request stamped with the current time and no access token.
    pub fn new() -> Self {
        Self {
            access_token: None,
            intent: None,
            timestamp: Some(Utc::now()),
        }
    }

    /// Set the session's linked-account access token.
    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_string());
        self
    }

    /// Set the intent name.
    pub fn with_intent(mut self, name: &str) -> Self {
        self.intent = Some(name.to_string());
        self
    }

    /// Shift the request timestamp by `seconds` relative to now (negative = past).
    pub fn timestamp_offset(mut self, seconds: i64) -> Self {
        self.timestamp = Some(Utc::now() + Duration::seconds(seconds));
        self
    }

    /// Drop the request timestamp entirely.
    pub fn without_timestamp(mut self) -> Self {
        self.timestamp = None;
        self
    }

    /// Serialize to the exact bytes that will be signed and sent.
    pub fn build(self) -> Vec<u8> {
        let mut user = json!({ "userId": "amzn1.ask.account.TESTUSER" });
        if let Some(token) = self.access_token {
            user["accessToken"] = json!(token);
        }

        let mut request = json!({
            "type": "IntentRequest",
            "requestId": "amzn1.echo-api.request.0000",
            "locale": "en-US",
        });
        if let Some(ts) = self.timestamp {
            request["timestamp"] = json!(ts.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        if let Some(intent) = self.intent {
            request["intent"] = json!({ "name": intent, "confirmationStatus": "NONE" });
        }

        let payload = json!({
            "version": "1.0",
            "session": {
                "new": true,
                "sessionId": "amzn1.echo-api.session.0000",
                "application": { "applicationId": "amzn1.ask.skill.0000" },
                "user": user,
            },
            "request": request,
        });

        payload.to_string().into_bytes()
    }
}

impl Default for SkillRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
