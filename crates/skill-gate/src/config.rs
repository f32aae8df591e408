//! Skill Gate configuration.
//!
//! Configuration is loaded from environment variables. The protocol constants
//! (trusted certificate location, issuer, audience) are compiled in and cannot
//! be changed here.

use crate::auth::trust::RevocationMode;
use common::config::ObservabilityConfig;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default timeout for outbound certificate and discovery fetches.
pub const DEFAULT_OUTBOUND_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound for the outbound fetch timeout.
pub const MAX_OUTBOUND_TIMEOUT_SECONDS: u64 = 60;

/// Default discovery document refresh interval (24 hours).
pub const DEFAULT_DISCOVERY_REFRESH_SECONDS: u64 = 86_400;

/// Default and maximum request timestamp tolerance (the platform's 150 second window).
pub const DEFAULT_TIMESTAMP_TOLERANCE_SECONDS: i64 = 150;

/// Skill Gate configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// PEM bundle holding the root certificates the vendor chain must lead to.
    pub trust_anchors_path: PathBuf,

    /// Certificate revocation policy for chain building.
    pub revocation_mode: RevocationMode,

    /// Cache fetched signing certificates while they are inside their validity window.
    pub cert_cache_enabled: bool,

    /// Timeout applied to every outbound fetch.
    pub outbound_timeout: Duration,

    /// Maximum age of the cached discovery document and key set.
    pub discovery_refresh: Duration,

    /// Maximum distance between the request timestamp and now, in seconds.
    pub timestamp_tolerance_seconds: i64,

    /// Take the access token from `Authorization: Basic` instead of the session.
    pub debug_pat_auth: bool,

    /// Logging configuration.
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid revocation mode: {0}")]
    InvalidRevocationMode(String),

    #[error("Invalid boolean value: {0}")]
    InvalidBool(String),

    #[error("Invalid outbound timeout configuration: {0}")]
    InvalidOutboundTimeout(String),

    #[error("Invalid discovery refresh configuration: {0}")]
    InvalidDiscoveryRefresh(String),

    #[error("Invalid timestamp tolerance configuration: {0}")]
    InvalidTimestampTolerance(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let trust_anchors_path = vars
            .get("GATE_TRUST_ANCHORS_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("GATE_TRUST_ANCHORS_PATH".to_string()))?;

        let revocation_mode = match vars.get("GATE_CERT_REVOCATION_MODE") {
            Some(value) => value.parse::<RevocationMode>().map_err(|()| {
                ConfigError::InvalidRevocationMode(format!(
                    "GATE_CERT_REVOCATION_MODE only supports 'none', got '{value}'"
                ))
            })?,
            None => RevocationMode::NoCheck,
        };

        let cert_cache_enabled = parse_bool(vars, "GATE_CERT_CACHE_ENABLED")?;
        let debug_pat_auth = parse_bool(vars, "GATE_DEBUG_PAT_AUTH")?;
        let json_logs = parse_bool(vars, "GATE_JSON_LOGS")?;

        // Parse outbound timeout with validation
        let outbound_timeout_seconds =
            if let Some(value_str) = vars.get("GATE_OUTBOUND_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidOutboundTimeout(format!(
                        "GATE_OUTBOUND_TIMEOUT_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                    ))
                })?;

                if value == 0 || value > MAX_OUTBOUND_TIMEOUT_SECONDS {
                    return Err(ConfigError::InvalidOutboundTimeout(format!(
                        "GATE_OUTBOUND_TIMEOUT_SECONDS must be between 1 and {MAX_OUTBOUND_TIMEOUT_SECONDS}, got {value}"
                    )));
                }

                value
            } else {
                DEFAULT_OUTBOUND_TIMEOUT_SECONDS
            };

        let discovery_refresh_seconds =
            if let Some(value_str) = vars.get("GATE_DISCOVERY_REFRESH_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidDiscoveryRefresh(format!(
                        "GATE_DISCOVERY_REFRESH_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidDiscoveryRefresh(
                        "GATE_DISCOVERY_REFRESH_SECONDS must be greater than 0".to_string(),
                    ));
                }

                value
            } else {
                DEFAULT_DISCOVERY_REFRESH_SECONDS
            };

        let timestamp_tolerance_seconds =
            if let Some(value_str) = vars.get("GATE_REQUEST_TIMESTAMP_TOLERANCE_SECONDS") {
                let value: i64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidTimestampTolerance(format!(
                        "GATE_REQUEST_TIMESTAMP_TOLERANCE_SECONDS must be a valid integer, got '{value_str}': {e}"
                    ))
                })?;

                if value <= 0 || value > DEFAULT_TIMESTAMP_TOLERANCE_SECONDS {
                    return Err(ConfigError::InvalidTimestampTolerance(format!(
                        "GATE_REQUEST_TIMESTAMP_TOLERANCE_SECONDS must be between 1 and {DEFAULT_TIMESTAMP_TOLERANCE_SECONDS}, got {value}"
                    )));
                }

                value
            } else {
                DEFAULT_TIMESTAMP_TOLERANCE_SECONDS
            };

        Ok(Config {
            bind_address,
            trust_anchors_path,
            revocation_mode,
            cert_cache_enabled,
            outbound_timeout: Duration::from_secs(outbound_timeout_seconds),
            discovery_refresh: Duration::from_secs(discovery_refresh_seconds),
            timestamp_tolerance_seconds,
            debug_pat_auth,
            observability: ObservabilityConfig {
                json_logs,
                ..ObservabilityConfig::default()
            },
        })
    }
}

/// Parse an optional boolean flag. Absent means `false`.
fn parse_bool(vars: &HashMap<String, String>, name: &str) -> Result<bool, ConfigError> {
    match vars.get(name).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if v == "true" || v == "1" => Ok(true),
        Some(v) if v == "false" || v == "0" || v.is_empty() => Ok(false),
        Some(v) => Err(ConfigError::InvalidBool(format!(
            "{name} must be 'true' or 'false', got '{v}'"
        ))),
    }
}
