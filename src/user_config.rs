//! User-level configuration.
//! Holds the defaults a user applies to every template (`default_context`),
//! custom repository abbreviations, and the directories used for cloned
//! templates and replay records.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable pointing at an alternative user config file.
pub const CONFIG_ENV_VAR: &str = "CUTTER_CONFIG";

/// File name of the user config inside the home directory.
pub const USER_CONFIG_FILE: &str = ".cutterrc";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Where remote templates are cloned to.
    pub cutters_dir: PathBuf,
    /// Where replay records are stored.
    pub replay_dir: PathBuf,
    /// Values that replace template defaults for matching keys.
    pub default_context: IndexMap<String, serde_json::Value>,
    /// Prefix → expansion pairs, consulted before the built-in ones.
    pub abbreviations: IndexMap<String, String>,
}

impl Default for UserConfig {
    fn default() -> Self {
        let home = home_dir();
        Self {
            cutters_dir: home.join(".cutters"),
            replay_dir: home.join(".cutter_replay"),
            default_context: IndexMap::new(),
            abbreviations: IndexMap::new(),
        }
    }
}

fn home_dir() -> PathBuf {
    home::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_user<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    match path.strip_prefix("~") {
        Ok(rest) => home_dir().join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// Reads the user config at `config_path`.
///
/// # Errors
/// * `Error::ConfigDoesNotExistError` if the file is missing
/// * `Error::InvalidConfigurationError` if the YAML cannot be parsed
pub fn get_config<P: AsRef<Path>>(config_path: P) -> Result<UserConfig> {
    let config_path = config_path.as_ref();
    if !config_path.exists() {
        return Err(Error::ConfigDoesNotExistError {
            path: config_path.display().to_string(),
        });
    }

    debug!("Loading user config from {}", config_path.display());
    let content = std::fs::read_to_string(config_path)?;
    let mut config: UserConfig = if content.trim().is_empty() {
        UserConfig::default()
    } else {
        serde_yaml::from_str(&content).map_err(|e| Error::InvalidConfigurationError {
            path: config_path.display().to_string(),
            message: e.to_string(),
        })?
    };

    config.cutters_dir = expand_user(&config.cutters_dir);
    config.replay_dir = expand_user(&config.replay_dir);
    Ok(config)
}

/// Resolves the user config for a run.
///
/// With `default_config` the built-in defaults are used and no file is read.
/// An explicit `config_file` must exist. Otherwise `$CUTTER_CONFIG` is used when
/// set, then `~/.cutterrc` when present, then the defaults.
pub fn get_user_config(config_file: Option<&Path>, default_config: bool) -> Result<UserConfig> {
    if default_config {
        debug!("Using default user config");
        return Ok(UserConfig::default());
    }

    if let Some(path) = config_file {
        return get_config(path);
    }

    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return get_config(PathBuf::from(path));
    }

    let user_config_path = home_dir().join(USER_CONFIG_FILE);
    if user_config_path.exists() {
        get_config(user_config_path)
    } else {
        debug!("User config not found, using defaults");
        Ok(UserConfig::default())
    }
}
