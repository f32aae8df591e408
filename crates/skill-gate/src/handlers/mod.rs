//! HTTP request handlers for Skill Gate.

pub mod health;
pub mod metrics;
pub mod skill;

pub use health::health_check;
pub use metrics::metrics_handler;
pub use skill::handle_skill_request;
