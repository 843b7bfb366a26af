//! Config path resolution

use std::path::PathBuf;

use super::{ConfigError, ConfigResult};

/// Environment variable that overrides the config file location
pub const CONFIG_ENV_VAR: &str = "ROWSHAPE_CONFIG";

/// File name used when no override is set
pub const DEFAULT_CONFIG_FILE: &str = "rowshape.toml";

/// Returns the config file path.
///
/// `$ROWSHAPE_CONFIG` if set and non-empty, otherwise `rowshape.toml` in the
/// current working directory.
pub fn default_config_path() -> ConfigResult<PathBuf> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => {
            let cwd = std::env::current_dir().map_err(ConfigError::IoError)?;
            Ok(cwd.join(DEFAULT_CONFIG_FILE))
        }
    }
}
