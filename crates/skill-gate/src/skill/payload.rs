//! Webhook payload model.
//!
//! Only the fields the gate reads are modelled; everything else in the
//! platform's envelope is ignored on deserialization.

use chrono::{DateTime, Utc};
use common::secret::{ExposeSecret, SecretString};
use serde::Deserialize;

/// A skill request as sent by the voice platform.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequest {
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub session: Option<Session>,

    pub request: RequestBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub new: bool,

    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub user_id: Option<String>,

    /// Linked-account access token issued by the identity provider.
    #[serde(default)]
    pub access_token: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    #[serde(rename = "type")]
    pub request_type: String,

    #[serde(default)]
    pub request_id: Option<String>,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub intent: Option<Intent>,
}

#[derive(Debug, Deserialize)]
pub struct Intent {
    pub name: String,
}

impl SkillRequest {
    /// Parse the raw body. Called only after the signature has been verified.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// The session's access token, if present and non-blank.
    pub fn access_token(&self) -> Option<&SecretString> {
        self.session
            .as_ref()?
            .user
            .as_ref()?
            .access_token
            .as_ref()
            .filter(|token| !token.expose_secret().trim().is_empty())
    }

    /// Intent name for intent requests.
    pub fn intent_name(&self) -> Option<&str> {
        self.request.intent.as_ref().map(|intent| intent.name.as_str())
    }

    /// When the platform created the request.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.request.timestamp
    }
}
