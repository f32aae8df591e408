//! # Skill Test Utilities
//!
//! Shared test utilities for the skill gate.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (fixed RSA keys for reproducible tests)
//! - Certificate chain builders (root, intermediate, vendor leaf)
//! - Signed skill request builders
//! - Access token builders
//! - Mock identity provider and certificate host (wiremock)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use skill_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let pki = TestPki::new()?;
//!     let vendor = pki.vendor().build()?;
//!
//!     let body = SkillRequestBuilder::new().with_intent("Account").build();
//!     let signature = sign_body(VENDOR_KEY_PEM, &body)?;
//!
//!     let idp = MockIdentityProvider::start(&[PublishedKey {
//!         kid: "key-a",
//!         pem: IDP_KEY_A_PEM,
//!     }])
//!     .await?;
//!     let token = TestTokenBuilder::new(&idp.issuer())
//!         .with_kid("key-a")
//!         .sign(IDP_KEY_A_PEM)?;
//! }
//! ```

pub mod cert_builders;
pub mod cert_host;
pub mod crypto_fixtures;
pub mod mock_idp;
pub mod request_builders;
pub mod token_builders;

// Re-export commonly used items
pub use cert_builders::*;
pub use cert_host::*;
pub use crypto_fixtures::*;
pub use mock_idp::*;
pub use request_builders::*;
pub use token_builders::*;
