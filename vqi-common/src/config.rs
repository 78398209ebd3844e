//! Configuration loading and output folder resolution
//!
//! Bootstrap configuration comes from a single TOML file. Every field has a
//! built-in default, so a missing file is not an error; a malformed one is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an alternative config file
pub const CONFIG_ENV_VAR: &str = "VQI_CONFIG";

/// Environment variable naming the output folder
pub const OUTPUT_DIR_ENV_VAR: &str = "VQI_OUTPUT_DIR";

/// Default Clarivate Web of Science Journals API endpoint
pub const CLARIVATE_BASE_URL: &str = "https://api.clarivate.com/apis/wos-journals/v1";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TomlConfig {
    /// Folder receiving built index files (optional)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Clarivate API key (optional, environment takes priority)
    #[serde(default)]
    pub clarivate_api_key: Option<String>,

    /// Clarivate client tuning (optional)
    #[serde(default)]
    pub clarivate: ClarivateSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Clarivate client and enrichment settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ClarivateSettings {
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Page size for the `/journals` listing
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Concurrent report fetches
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Retries per report after the first attempt
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Courtesy delay after each completed report request
    #[serde(default)]
    pub request_delay_ms: u64,

    /// Token bucket quota shared by all requests of one client
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClarivateSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            workers: default_workers(),
            retries: default_retries(),
            request_delay_ms: 0,
            requests_per_second: default_requests_per_second(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    CLARIVATE_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_workers() -> usize {
    3
}

fn default_retries() -> u32 {
    2
}

fn default_requests_per_second() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    60
}

/// Standard User-Agent for outbound HTTP requests
pub fn get_user_agent() -> String {
    format!("VQI/{} (venue-quality-index)", env!("CARGO_PKG_VERSION"))
}

/// Default config file location: `<config dir>/vqi/<module>.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vqi").join(format!("{}.toml", module_name)))
}

/// Pick the config file path
///
/// Priority: command-line argument, then `VQI_CONFIG`, then the platform default.
pub fn resolve_config_path(cli_arg: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path(module_name)
}

/// Load TOML configuration
///
/// A missing file yields `TomlConfig::default()`. An unreadable file is an
/// `Error::Io`; malformed TOML is an `Error::Config`.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        debug!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Output folder resolution
///
/// Priority order:
/// 1. Command-line argument
/// 2. `VQI_OUTPUT_DIR` environment variable
/// 3. TOML `output_dir`
/// 4. `./output`
pub fn resolve_output_dir(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(OUTPUT_DIR_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.output_dir {
        return path.clone();
    }

    PathBuf::from("output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_format() {
        let ua = get_user_agent();
        assert!(ua.starts_with("VQI/"));
        assert!(ua.contains("venue-quality-index"));
    }

    #[test]
    fn test_default_config_path_names_module() {
        if let Some(path) = default_config_path("vqi-builder") {
            assert!(path.ends_with("vqi/vqi-builder.toml"));
        }
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ClarivateSettings::default();
        assert_eq!(settings.base_url, CLARIVATE_BASE_URL);
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.workers, 3);
        assert_eq!(settings.retries, 2);
        assert_eq!(settings.request_delay_ms, 0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            clarivate_api_key = "abc"

            [clarivate]
            workers = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.clarivate_api_key.as_deref(), Some("abc"));
        assert_eq!(config.clarivate.workers, 8);
        assert_eq!(config.clarivate.page_size, 100);
        assert_eq!(config.logging.level, "info");
        assert!(config.output_dir.is_none());
    }
}
