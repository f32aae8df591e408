//! Observability module for Skill Gate.
//!
//! Provides metrics definitions and the Prometheus recorder setup.

pub mod metrics;
