//! Tests for configuration loading and path resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate VQI_OUTPUT_DIR or VQI_CONFIG are marked with #[serial]
//! to ensure they run sequentially, not in parallel.

use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vqi_common::config::{
    load_toml_config, resolve_config_path, resolve_output_dir, TomlConfig, CONFIG_ENV_VAR,
    OUTPUT_DIR_ENV_VAR,
};

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_full_file_is_parsed() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("vqi-builder.toml");
    std::fs::write(
        &path,
        r#"
output_dir = "/data/vqi"
clarivate_api_key = "toml-key"

[logging]
level = "debug"

[clarivate]
base_url = "http://localhost:9999"
page_size = 50
workers = 4
retries = 5
request_delay_ms = 250
requests_per_second = 2
timeout_secs = 10
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.output_dir, Some(PathBuf::from("/data/vqi")));
    assert_eq!(config.clarivate_api_key.as_deref(), Some("toml-key"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.clarivate.base_url, "http://localhost:9999");
    assert_eq!(config.clarivate.page_size, 50);
    assert_eq!(config.clarivate.workers, 4);
    assert_eq!(config.clarivate.retries, 5);
    assert_eq!(config.clarivate.request_delay_ms, 250);
    assert_eq!(config.clarivate.requests_per_second, 2);
    assert_eq!(config.clarivate.timeout_secs, 10);
}

#[test]
fn test_malformed_file_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "output_dir = [unterminated").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(matches!(err, vqi_common::Error::Config(_)));
}

#[test]
fn test_unreadable_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();

    // A directory exists but cannot be read as a file
    let err = load_toml_config(temp_dir.path()).unwrap_err();
    assert!(matches!(err, vqi_common::Error::Io(_)));
}

#[test]
#[serial]
fn test_output_dir_cli_wins() {
    env::set_var(OUTPUT_DIR_ENV_VAR, "/tmp/vqi-env-out");
    let config = TomlConfig {
        output_dir: Some(PathBuf::from("/tmp/vqi-toml-out")),
        ..TomlConfig::default()
    };

    let dir = resolve_output_dir(Some(Path::new("/tmp/vqi-cli-out")), &config);
    assert_eq!(dir, PathBuf::from("/tmp/vqi-cli-out"));

    env::remove_var(OUTPUT_DIR_ENV_VAR);
}

#[test]
#[serial]
fn test_output_dir_env_over_toml() {
    env::set_var(OUTPUT_DIR_ENV_VAR, "/tmp/vqi-env-out");
    let config = TomlConfig {
        output_dir: Some(PathBuf::from("/tmp/vqi-toml-out")),
        ..TomlConfig::default()
    };

    assert_eq!(
        resolve_output_dir(None, &config),
        PathBuf::from("/tmp/vqi-env-out")
    );

    env::remove_var(OUTPUT_DIR_ENV_VAR);
}

#[test]
#[serial]
fn test_output_dir_toml_then_fallback() {
    env::remove_var(OUTPUT_DIR_ENV_VAR);
    let config = TomlConfig {
        output_dir: Some(PathBuf::from("/tmp/vqi-toml-out")),
        ..TomlConfig::default()
    };
    assert_eq!(
        resolve_output_dir(None, &config),
        PathBuf::from("/tmp/vqi-toml-out")
    );

    assert_eq!(
        resolve_output_dir(None, &TomlConfig::default()),
        PathBuf::from("output")
    );
}

#[test]
#[serial]
fn test_config_path_env_override() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/custom-vqi.toml");
    assert_eq!(
        resolve_config_path(None, "vqi-builder"),
        Some(PathBuf::from("/tmp/custom-vqi.toml"))
    );
    assert_eq!(
        resolve_config_path(Some(Path::new("/tmp/cli.toml")), "vqi-builder"),
        Some(PathBuf::from("/tmp/cli.toml"))
    );
    env::remove_var(CONFIG_ENV_VAR);
}
