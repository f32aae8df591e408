//! Webhook authentication.
//!
//! # Components
//!
//! - `location` - Trusted certificate URL check
//! - `http` - Outbound fetches with timeout, cancellation and size caps
//! - `certificate` - Signing certificate retrieval and parsing
//! - `cert_cache` - Optional cache in front of the certificate store
//! - `trust` - Chain building to configured trust anchors
//! - `signature` - Request signature verification pipeline
//! - `discovery` - OpenID discovery and signing key cache
//! - `token` - Bearer token validation with one rotation retry
//! - `principal` - Validated identity and bearer credential
//! - `authenticator` - The combined per-request decision

pub mod authenticator;
pub mod cert_cache;
pub mod certificate;
pub mod discovery;
pub mod http;
pub mod location;
pub mod principal;
pub mod signature;
pub mod token;
pub mod trust;

pub use authenticator::{AuthDecision, DenialReason, RejectReason, RequestAuthenticator};
pub use cert_cache::CachingCertificateStore;
pub use certificate::{Certificate, CertificateFetchError, CertificateStore, HttpCertificateStore};
pub use discovery::{DiscoveryCache, DiscoveryError, SigningKeySet};
pub use principal::{BearerToken, ValidatedPrincipal};
pub use signature::{SignatureError, SignatureVerifier};
pub use token::{TokenError, TokenValidator};
pub use trust::{RevocationMode, TrustAnchors};
