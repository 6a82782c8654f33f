//! Configuration loading functionality
//!
//! Configuration is layered with the `config` crate:
//! 1. Default values (serde defaults, lowest priority)
//! 2. JSON configuration file
//! 3. Environment variables prefixed with `TLS_CERT_MONITOR_`
//!
//! Command line overrides are applied on top by the caller, see
//! [`super::ConfigOverrides`].

use std::fs;
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use log::{debug, info};

use crate::common::{MonitorError, Result};
use super::defaults::{DEFAULT_CONFIG_FILE, ENV_PREFIX};
use super::MonitorConfig;

impl MonitorConfig {
    /// Load configuration from all sources
    ///
    /// When `path` is given the file must exist; otherwise
    /// `tls-cert-monitor.json` in the working directory is used if present.
    /// The result is validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                File::from(path).format(FileFormat::Json).required(true)
            }
            None => {
                debug!("Looking for optional configuration file {}", DEFAULT_CONFIG_FILE);
                File::from(Path::new(DEFAULT_CONFIG_FILE))
                    .format(FileFormat::Json)
                    .required(false)
            }
        };

        let config: Self = Config::builder()
            .add_source(file)
            .add_source(env_source())
            .build()?
            .try_deserialize()?;

        config.validate()?;

        debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Load configuration from a JSON file only
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path_display = path.display();

        let content = fs::read_to_string(path)
            .map_err(|e| MonitorError::Config(format!("Failed to read config file {}: {}", path_display, e)))?;

        serde_json::from_str(&content)
            .map_err(|e| MonitorError::Config(format!("Failed to parse JSON config file {}: {}", path_display, e)))
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        let config = Config::builder()
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX).try_parsing(true)
}
