//! Secret types for protecting credentials from accidental logging.
//!
//! Re-exports types from the [`secrecy`] crate. Access tokens lifted out of
//! skill payloads and `Authorization` headers are wrapped in `SecretString`
//! as soon as they are extracted, so any struct that derives `Debug` around
//! them logs `[REDACTED]` instead of the credential.
//!
//! # Example
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! #[derive(Debug)]
//! struct SessionCredential {
//!     user_id: String,
//!     access_token: SecretString,
//! }
//!
//! let credential = SessionCredential {
//!     user_id: "amzn1.ask.account.TEST".to_string(),
//!     access_token: SecretString::from("eyJhbGciOi..."),
//! };
//!
//! // Safe: the token is redacted
//! println!("{:?}", credential);
//!
//! // Reading the value requires an explicit call
//! let token: &str = credential.access_token.expose_secret();
//! ```
//!
//! # Usage Guidelines
//!
//! Use `SecretString` for:
//! - Session access tokens from skill payloads
//! - Personal access tokens on the debug path
//! - Any bearer credential forwarded to downstream APIs
//!
//! Use `SecretBox<T>` for custom secret types (e.g., `SecretBox<[u8]>`).
//!
//! # Serde Integration
//!
//! With the `serde` feature enabled, secrets deserialize straight out of a
//! request payload:
//!
//! ```rust
//! use serde::Deserialize;
//! use common::secret::SecretString;
//!
//! #[derive(Debug, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct User {
//!     user_id: String,
//!     access_token: Option<SecretString>,
//! }
//!
//! let json = r#"{"userId": "amzn1.ask.account.X", "accessToken": "tok"}"#;
//! let user: User = serde_json::from_str(json).unwrap();
//! println!("{:?}", user);
//! ```

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretBox, SecretString};

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("eyJhbGciOiJSUzI1NiJ9.payload.sig");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("eyJhbGciOiJSUzI1NiJ9"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("pat-token-123");
        assert_eq!(secret.expose_secret(), "pat-token-123");
    }

    #[test]
    fn test_deserialize_optional_session_token() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct User {
            user_id: String,
            access_token: Option<SecretString>,
        }

        let json = r#"{"userId": "amzn1.ask.account.X", "accessToken": "session-secret"}"#;
        let user: User = serde_json::from_str(json).expect("deserialize");
        assert_eq!(
            user.access_token.as_ref().map(|t| t.expose_secret()),
            Some("session-secret")
        );

        let debug = format!("{user:?}");
        assert!(debug.contains("amzn1.ask.account.X"));
        assert!(!debug.contains("session-secret"));

        let json = r#"{"userId": "amzn1.ask.account.Y"}"#;
        let user: User = serde_json::from_str(json).expect("deserialize");
        assert!(user.access_token.is_none());
    }
}
