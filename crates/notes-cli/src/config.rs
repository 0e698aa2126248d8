//! Configuration loading and management.
//!
//! Resolution order, later layers winning: built-in defaults, the JSON file
//! in the config directory, environment variables, command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "https://noteapp-moei.onrender.com/api";

pub const API_URL_ENV: &str = "NOTES_API_URL";
pub const TOKEN_ENV: &str = "NOTES_TOKEN";

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine a config directory; pass --config")]
    NoConfigDir,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Contents of `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Base URL of the notes API, including the `/api` prefix
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token from the identity provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub token: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub api_url: String,
    pub token: Option<String>,
    /// Config file that contributed, if one existed
    pub file: Option<PathBuf>,
}

impl CliConfig {
    /// Resolve configuration from all layers.
    ///
    /// `env` looks up environment variables; empty values count as unset.
    pub fn resolve(
        config_dir: &Path,
        overrides: Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        let (file_config, file) = match load_file(&path)? {
            Some(config) => (config, Some(path)),
            None => (FileConfig::default(), None),
        };

        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_url = overrides
            .api_url
            .or_else(|| lookup(API_URL_ENV))
            .unwrap_or(file_config.api_url);
        let token = overrides
            .token
            .or_else(|| lookup(TOKEN_ENV))
            .or(file_config.token);

        Ok(Self {
            api_url,
            token,
            file,
        })
    }
}

/// Read `config.json`, returning `None` when it does not exist.
fn load_file(path: &Path) -> Result<Option<FileConfig>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}", path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(Some(config))
}

/// Write a default `config.json` for reference unless one exists.
///
/// Returns the file path and whether it was created.
pub fn init(config_dir: &Path) -> Result<(PathBuf, bool), ConfigError> {
    let path = config_dir.join(CONFIG_FILE);
    if path.exists() {
        return Ok((path, false));
    }

    std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
        path: config_dir.to_path_buf(),
        source,
    })?;
    let content = serde_json::to_string_pretty(&FileConfig::default()).map_err(|source| {
        ConfigError::Parse {
            path: path.clone(),
            source,
        }
    })?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!("Created default config at {}", path.display());
    Ok((path, true))
}

/// `<platform config dir>/notes`, or the expanded `--config` value.
pub fn config_dir(explicit: Option<&str>) -> Result<PathBuf, ConfigError> {
    match explicit {
        Some(path) => Ok(expand_tilde(path)),
        None => dirs::config_dir()
            .map(|dir| dir.join("notes"))
            .ok_or(ConfigError::NoConfigDir),
    }
}

/// Expand ~ or ~/ prefix to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    }
}
