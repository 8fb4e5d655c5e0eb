//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{DevServerSettings, GatewayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Settings error in {path}: {source}")]
    Settings {
        path: String,
        #[source]
        source: serde_json::Error,
    },
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
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Read the optional dev server settings file.
///
/// A missing file yields `None`; an unreadable or malformed one is an error.
pub fn load_settings(path: &Path) -> Result<Option<DevServerSettings>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let settings = serde_json::from_str(&content).map_err(|source| ConfigError::Settings {
        path: path.display().to_string(),
        source,
    })?;

    Ok(Some(settings))
}

/// Merge the `Piral` section of the settings file into the configuration.
pub fn apply_settings(config: &mut GatewayConfig, settings: DevServerSettings) {
    let Some(piral) = settings.piral else {
        return;
    };

    if let Some(paths) = piral.forwarded_paths {
        config.forwarded_paths = paths;
    }

    if let Some(feed_url) = piral.feed_url.filter(|url| !url.is_empty()) {
        config.feed.remote_feed_url = Some(feed_url);
    }
}
