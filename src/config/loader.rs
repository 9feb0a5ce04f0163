//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `backend.api_url`.
pub const ENV_API_URL: &str = "API_URL";
/// Environment variable overriding `backend.api_key`.
pub const ENV_API_KEY: &str = "API_KEY";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
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

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply `API_URL` / `API_KEY` overrides using the given lookup.
///
/// Empty values are ignored, so an exported but blank variable keeps the
/// configured value.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
        config.backend.api_url = url;
    }
    if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
        config.backend.api_key = key;
    }
}

/// Build the effective configuration: file (or defaults), then environment,
/// then validation.
///
/// This is the only place the gateway reads `API_URL` and `API_KEY`.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Replace the listener address (from the command line) and re-validate.
pub fn override_bind_address(
    mut config: GatewayConfig,
    bind_address: &str,
) -> Result<GatewayConfig, ConfigError> {
    config.listener.bind_address = bind_address.to_string();
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
