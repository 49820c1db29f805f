// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{RegenError, Result};

/// Config file looked up in the invocation directory.
pub const DEFAULT_CONFIG_FILE: &str = "pyxregen.toml";

/// Environment variable that overrides [`DEFAULT_CONFIG_FILE`].
pub const CONFIG_ENV_VAR: &str = "PYXREGEN_CONFIG";

/// Read and deserialize a config file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| RegenError::io(path, e))?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the config from `path` if it exists, otherwise use the defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if path.exists() {
        debug!(path = ?path, "loading config");
        load_and_validate(path)
    } else {
        debug!(path = ?path, "no config file; using defaults");
        Ok(ConfigFile::default())
    }
}

/// Resolve the config path: `PYXREGEN_CONFIG` if set, else
/// `pyxregen.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
