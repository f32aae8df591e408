//! Common utilities and types shared across Skill Gate components.

#![warn(clippy::pedantic)]

/// Module for common error types
pub mod error;

/// Module for common configuration
pub mod config;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (header inspection, size limits, constants)
pub mod jwt;
