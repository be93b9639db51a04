use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::types::client_config::{ClientConfig, ConfigError};

pub fn load_config(path: impl AsRef<Path>) -> Result<ClientConfig, ConfigError> {
    let path = path.as_ref();
    info!("Loading configuration from: {}", path.display());

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path.display());

    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<ClientConfig, ConfigError> {
    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config: ClientConfig = toml::from_str(contents)?;

    info!("Configuration loaded successfully");
    debug!("Config: {:?}", config);

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

fn validate_config(config: &ClientConfig) -> Result<(), ConfigError> {
    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::InvalidConfig("api.base_url cannot be empty".into()));
    }

    // The transport speaks plain HTTP/1 only.
    if !base_url.starts_with("http://") {
        return Err(ConfigError::InvalidConfig(
            "api.base_url must start with http:// (https is not supported)".into(),
        ));
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "api.timeout_secs must be greater than 0".into(),
        ));
    }

    if config.sync.poll_interval_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "sync.poll_interval_secs must be greater than 0".into(),
        ));
    }

    if config.sync.default_page_size == 0 {
        return Err(ConfigError::InvalidConfig(
            "sync.default_page_size must be greater than 0".into(),
        ));
    }

    if config.session.store_path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "session.store_path cannot be empty".into(),
        ));
    }

    Ok(())
}
