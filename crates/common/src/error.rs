//! Common error types for Skill Gate components.

use thiserror::Error;

/// Common errors that can occur across Skill Gate components
#[derive(Error, Debug)]
pub enum SkillGateError {
    /// Network transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Operation cancelled by the caller before completion
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

/// Result type alias using `SkillGateError`
pub type Result<T> = std::result::Result<T, SkillGateError>;
