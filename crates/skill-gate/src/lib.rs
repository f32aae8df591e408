//! Skill Gate
//!
//! Authentication gate for voice-assistant skill webhooks. Every call must
//! prove two things before any intent is handled:
//!
//! - It was sent by the voice platform: the `Signature` header verifies
//!   against the body with a certificate fetched from the platform's fixed
//!   location, valid now, issued to the platform's name and chaining to a
//!   configured trust anchor.
//! - It carries a linked account: the session's access token is a signed
//!   token from the expected issuer for the expected audience, verified with
//!   keys from the issuer's OpenID discovery document.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/skill.rs -> auth::RequestAuthenticator
//!                                         |-> auth::SignatureVerifier
//!                                         |-> auth::TokenValidator -> auth::DiscoveryCache
//!                                     -> skill::IntentRouter
//! ```
//!
//! # Modules
//!
//! - `auth` - Signature, certificate, discovery and token checks
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `skill` - Webhook payload, intent routing and speech responses

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod skill;
