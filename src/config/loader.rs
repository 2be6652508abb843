//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Comma-separated API keys appended to `api_keys.keys`.
pub const VALID_KEYS_ENV: &str = "WORLDMONITOR_VALID_KEYS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse, apply environment overrides and validate.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let mut config: GatewayConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Defaults plus environment overrides, for running without a file.
pub fn default_config() -> Result<GatewayConfig, ConfigError> {
    parse_config("")
}

pub fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Ok(raw) = std::env::var(VALID_KEYS_ENV) {
        let before = config.api_keys.keys.len();
        merge_keys(&mut config.api_keys.keys, &raw);
        tracing::debug!(
            added = config.api_keys.keys.len() - before,
            "API keys loaded from {}",
            VALID_KEYS_ENV
        );
    }
}

fn merge_keys(keys: &mut Vec<String>, raw: &str) {
    for key in raw.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        if !keys.iter().any(|existing| existing == key) {
            keys.push(key.to_string());
        }
    }
}
