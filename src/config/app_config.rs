use std::env;
use std::path::Path;
use std::time::Duration;

use crate::curl::invocation::DEFAULT_CURL_BIN;
use crate::error::ConfigError;
use crate::exec::DEFAULT_TIMEOUT;
use crate::mtr::DEFAULT_MTR_BIN;
use crate::ping::DEFAULT_PING_BIN;

use super::probe_config::Config;

pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Where the external tools live and how long each may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub curl: String,
    pub mtr: String,
    pub ping: String,
    pub timeout: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            curl: DEFAULT_CURL_BIN.to_string(),
            mtr: DEFAULT_MTR_BIN.to_string(),
            ping: DEFAULT_PING_BIN.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ToolConfig {
    /// Reads `CURL_BIN`, `MTR_BIN`, `PING_BIN` and `PROBE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let timeout = match lookup("PROBE_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Env {
                    name: "PROBE_TIMEOUT_SECS",
                    value,
                })?,
            None => defaults.timeout,
        };

        Ok(Self {
            curl: lookup("CURL_BIN").unwrap_or(defaults.curl),
            mtr: lookup("MTR_BIN").unwrap_or(defaults.mtr),
            ping: lookup("PING_BIN").unwrap_or(defaults.ping),
            timeout,
        })
    }
}

/// Probe groups plus what the text output needs to align them.
pub struct AppConfig {
    pub config: Config,
    pub max_group_width: usize,
}

/// Parse a probe configuration file.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let display = path.display().to_string();
    let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    serde_yaml::from_str(&config_str).map_err(|source| ConfigError::Yaml {
        path: display,
        source,
    })
}

/// Load the probe configuration from a YAML file.
/// This function reads the configuration file given by `path`, falling back to
/// the `CONFIG_FILE` environment variable and then `config.yml`. Tool locations
/// and the timeout come from [`ToolConfig::from_env`].
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let config_file_location = match path {
        Some(path) => path.to_path_buf(),
        None => env::var("CONFIG_FILE")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
            .into(),
    };
    log::info!("Using config file: {}", config_file_location.display());

    let config = read_config(&config_file_location)?;
    let max_group_width = config.keys().map(|group| group.len()).max().unwrap_or(10);

    Ok(AppConfig {
        config,
        max_group_width,
    })
}
