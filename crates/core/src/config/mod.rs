//! Configuration for rowshape
//!
//! Settings are stored as TOML and loaded through serde:
//! - Logging verbosity and filter directives
//! - Conversion strictness
//!
//! # Example
//!
//! ```ignore
//! use rowshape_core::config::{self, EngineConfig};
//!
//! let path = config::default_config_path()?;
//! let cfg = EngineConfig::load(&path)?;
//! rowshape_core::logging::init(&cfg);
//! config::install(cfg)?;
//! ```
//!
//! Installation is one-shot and must happen before the first converter is
//! requested from the global cache, which reads the installed options once.

mod loader;

use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

pub use loader::{default_config_path, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A process-wide config was already installed
    #[error("Config already installed")]
    AlreadyInstalled,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Options applied by copy converters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Reject source records carrying keys the target shape does not declare
    pub reject_extra_keys: bool,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Enable debug logging
    pub debug: bool,

    /// `tracing_subscriber::EnvFilter` directives, e.g. `"rowshape_core=trace"`
    pub log_filter: String,

    /// Converter behavior
    pub conversion: ConversionOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
            log_filter: "info".to_string(),
            conversion: ConversionOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from file, creating default if missing.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&content)?;
            tracing::debug!("Loaded config from {:?}", path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save(path)?;
            tracing::info!("Created default config at {:?}", path);
            Ok(default)
        }
    }

    /// Save config to file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reload config from file.
    pub fn reload(&mut self, path: &Path) -> ConfigResult<()> {
        let content = std::fs::read_to_string(path)?;
        *self = Self::from_toml_str(&content)?;
        tracing::debug!("Reloaded config from {:?}", path);
        Ok(())
    }

    /// Filter directives actually applied by the logger
    pub fn effective_log_filter(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_filter
        }
    }
}

/// Process-wide installed config
static INSTALLED: OnceLock<EngineConfig> = OnceLock::new();

/// Install the process-wide config
///
/// Returns an error if a config was already installed or the defaults were
/// already observed through [`installed`].
pub fn install(config: EngineConfig) -> ConfigResult<()> {
    INSTALLED
        .set(config)
        .map_err(|_| ConfigError::AlreadyInstalled)
}

/// The installed config, or the defaults if none was installed
///
/// The first call without a prior [`install`] locks in the defaults.
pub fn installed() -> &'static EngineConfig {
    INSTALLED.get_or_init(EngineConfig::default)
}
