// ABOUTME: Per-project configuration stored as fastack.json in the deployed directory.
// ABOUTME: Handles discovery, JSON parsing, and conversion into session settings.

mod init;
mod timeouts;

pub use init::init_config;
pub use timeouts::TimeoutConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::remote::{RetryPolicy, SessionSettings};
use crate::types::{AppName, AppNameError};

pub const CONFIG_FILENAME: &str = "fastack.json";

/// Endpoint used when neither the command line nor the environment names one.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no fastack.json found in {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid app name: {0}")]
    InvalidApp(#[from] AppNameError),

    #[error("file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Stored login token; when present no credentials are requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub retry: RetryPolicy,
}

impl ProjectConfig {
    /// Parse config text; `path` is only used in error messages.
    pub fn from_json(json: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, path)
    }

    /// Load `fastack.json` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when the file does not exist.
    pub async fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILENAME);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing(dir.to_path_buf()));
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        Self::from_json(&content, &path)
    }

    /// The configured app name, validated.
    pub fn app_name(&self) -> Result<Option<AppName>, ConfigError> {
        self.app
            .as_deref()
            .map(AppName::new)
            .transpose()
            .map_err(ConfigError::from)
    }

    /// The stored token, ignoring blank values.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Timeouts and retry behavior for the remote session.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            connect_timeout: self.timeouts.connect,
            call_timeout: self.timeouts.call,
            retry: self.retry.clone(),
        }
    }

    pub fn template(app: Option<AppName>) -> Self {
        ProjectConfig {
            token: None,
            app: app.map(|name| name.to_string()),
            timeouts: TimeoutConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}
