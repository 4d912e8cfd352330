//! CLI configuration from `~/.redink/config.toml`.
//!
//! Every section is optional; a missing file means all defaults. The server
//! URL can also come from the `REDINK_SERVER` environment variable or the
//! `--server` flag, which both beat the file.

use std::fmt;
use std::path::PathBuf;
use std::{env, fs};

use serde::Deserialize;

use redink_api::DEFAULT_BASE_URL;

#[derive(Debug, Default, Deserialize)]
pub struct RedinkConfig {
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    /// Base URL including the API prefix, e.g. `http://localhost:8080/api/v1`.
    pub base_url: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse {}: {source}", path.display())
            }
        }
    }
}

impl RedinkConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(source) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, source);
                return Err(ConfigError::Read { path, source });
            }
        };
        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(source) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, source);
                Err(ConfigError::Parse { path, source })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".redink").join("config.toml"))
}

/// Pick the server base URL. Precedence: `--server` flag, `REDINK_SERVER`,
/// config file, compiled-in default.
pub fn resolve_base_url(flag: Option<String>, config: Option<&RedinkConfig>) -> String {
    if let Some(url) = flag {
        return url;
    }
    if let Ok(url) = env::var("REDINK_SERVER")
        && !url.is_empty()
    {
        return url;
    }
    config
        .and_then(|config| config.server.as_ref())
        .and_then(|server| server.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
}
