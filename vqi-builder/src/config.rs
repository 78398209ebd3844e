//! Credential resolution for vqi-builder
//!
//! Provides two-tier resolution with ENV → TOML priority. Resolution happens
//! before any client is built, so a missing key fails the build without
//! touching the network.

use crate::error::{BuildError, BuildResult};
use tracing::{info, warn};
use vqi_common::config::TomlConfig;

/// Environment variable holding the Clarivate API key
pub const CLARIVATE_API_KEY_ENV_VAR: &str = "CLARIVATE_API_KEY";

/// Resolve the Clarivate API key
///
/// **Priority:** ENV → TOML
pub fn resolve_clarivate_api_key(toml_config: &TomlConfig) -> BuildResult<String> {
    let env_key = std::env::var(CLARIVATE_API_KEY_ENV_VAR)
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .clarivate_api_key
        .as_deref()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!("Clarivate API key found in environment and TOML. Using environment (highest priority).");
    }

    if let Some(key) = env_key {
        info!("Clarivate API key loaded from environment variable");
        return Ok(key.trim().to_string());
    }

    if let Some(key) = toml_key {
        info!("Clarivate API key loaded from TOML config");
        return Ok(key.trim().to_string());
    }

    Err(BuildError::Configuration(format!(
        "Clarivate API key not configured. Set one of:\n\
         1. Environment: {}=your-key-here\n\
         2. TOML config: clarivate_api_key = \"your-key\"",
        CLARIVATE_API_KEY_ENV_VAR
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
