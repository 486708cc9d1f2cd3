use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FaynoError, Result};

pub const DEFAULT_SERVER: &str = "https://example.com";
pub const DEFAULT_OWNER: &str = "example";

pub const ENV_TOKEN: &str = "FAYNOSYNC_TOKEN";
pub const ENV_URL: &str = "FAYNOSYNC_URL";
pub const ENV_ACCOUNT: &str = "FAYNOSYNC_ACCOUNT";

/// Persistent settings stored in `~/.faynosync/config.yaml`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub server: String,

    #[serde(default)]
    pub owner: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            owner: DEFAULT_OWNER.to_string(),
        }
    }
}

impl Config {
    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".faynosync").join("config.yaml"))
            .ok_or(FaynoError::NoHomeDir)
    }

    /// Load configuration from file; a missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FaynoError::ConfigNotFound)
            }
            Err(e) => return Err(e.into()),
        };

        serde_yml::from_str(&content).map_err(|e| FaynoError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn save_at(&self, path: &Path) -> Result<()> {
        let content = self.to_yaml_string().map_err(|e| FaynoError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Write a fresh configuration file, creating its directory.
    pub fn init_at(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.save_at(path)
    }

    pub fn update_field(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server" => self.server = value.to_string(),
            "owner" => self.owner = value.to_string(),
            _ => return Err(FaynoError::UnknownConfigKey(key.to_string())),
        }
        Ok(())
    }

    pub fn to_yaml_string(&self) -> std::result::Result<String, serde_yml::Error> {
        serde_yml::to_string(self)
    }
}

/// Settings needed to talk to the server, resolved at upload time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub token: String,
    pub server: String,
    pub owner: String,
}

impl RuntimeConfig {
    /// Environment values win; the settings file is only read when the
    /// server or owner is missing from the environment.
    pub fn resolve<E, P>(env: E, config_path: P) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
        P: FnOnce() -> Result<PathBuf>,
    {
        let lookup = |key: &str| env(key).map(|v| v.trim().to_string()).unwrap_or_default();

        let token = lookup(ENV_TOKEN);
        if token.is_empty() {
            return Err(FaynoError::MissingToken { var: ENV_TOKEN });
        }

        let mut server = lookup(ENV_URL);
        let mut owner = lookup(ENV_ACCOUNT);

        if server.is_empty() || owner.is_empty() {
            let path = config_path()?;
            tracing::debug!("Reading settings from {}", path.display());
            let config = Config::load_from(&path)?;
            if server.is_empty() {
                server = config.server.trim().to_string();
            }
            if owner.is_empty() {
                owner = config.owner.trim().to_string();
            }
        }

        if server.is_empty() {
            return Err(FaynoError::EmptyServer { var: ENV_URL });
        }
        if owner.is_empty() {
            return Err(FaynoError::EmptyOwner { var: ENV_ACCOUNT });
        }

        Ok(Self {
            token,
            server,
            owner,
        })
    }
}
