//! Layered configuration.
//!
//! Sources, later overriding earlier:
//! 1. Bundled defaults (`include_str!` of `peroot.toml`)
//! 2. `~/.config/peroot/peroot.toml`
//! 3. `./peroot.toml`

use config::{Config, File, FileFormat};
use peroot_error::{ConfigError, PerootError, PerootResult};
use peroot_gateway::GatewayConfig;
use peroot_rate_limit::RateLimitConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../peroot.toml");

/// Complete Peroot configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PerootConfig {
    /// Fallback dispatch settings
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Caller quota settings
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl PerootConfig {
    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if any present source is unreadable or invalid, including a fallback
    /// order with duplicate ids or a zero rate limit window or store timeout.
    pub fn load() -> PerootResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(config_dir) = dirs::home_dir() {
            let home_config = config_dir.join(".config/peroot/peroot.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("peroot").required(false));

        builder
            .build()
            .map_err(|e| {
                PerootError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize::<Self>()
            .map_err(|e| {
                PerootError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?
            .validated()
    }

    /// The bundled defaults alone.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled file is invalid.
    pub fn bundled() -> PerootResult<Self> {
        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .and_then(Config::try_deserialize::<Self>)
            .map_err(|e| {
                PerootError::from(ConfigError::new(format!(
                    "Bundled configuration is invalid: {}",
                    e
                )))
            })?
            .validated()
    }

    /// Load configuration from a specific file path.
    ///
    /// Sections and keys missing from the file take their built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a rate limit setting is
    /// out of range.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> PerootResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                PerootError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize::<Self>()
            .map_err(|e| {
                PerootError::from(ConfigError::new(format!(
                    "Failed to parse configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .validated()
    }

    /// Check settings that parse but cannot work.
    fn validated(self) -> PerootResult<Self> {
        self.rate_limit.validate()?;
        Ok(self)
    }
}
