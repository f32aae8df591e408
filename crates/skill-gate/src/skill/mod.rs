//! Skill payload, intent routing and speech responses.
//!
//! - `payload` - Webhook payload model
//! - `router` - Intent routing behind a trait
//! - `response` - Plain-text speech envelope

pub mod payload;
pub mod response;
pub mod router;

pub use payload::SkillRequest;
pub use response::SpeechResponse;
pub use router::{AccountIntentRouter, IntentRouter};
