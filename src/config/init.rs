// ABOUTME: Config scaffolding for new apps.
// ABOUTME: Writes a fastack.json template into a project directory.

use std::path::{Path, PathBuf};

use crate::types::AppName;

use super::{CONFIG_FILENAME, ConfigError, ProjectConfig};

/// Write a template `fastack.json` into `dir` and return its path.
///
/// # Errors
///
/// Returns `ConfigError::AlreadyExists` when a config is present and `force`
/// is false, or `ConfigError::InvalidApp` for a malformed app name.
pub fn init_config(dir: &Path, app: Option<&str>, force: bool) -> Result<PathBuf, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(ConfigError::AlreadyExists(config_path));
    }

    let app = app.map(AppName::new).transpose()?;
    let config = ProjectConfig::template(app);

    let mut json = serde_json::to_string_pretty(&config).map_err(|source| ConfigError::Parse {
        path: config_path.clone(),
        source,
    })?;
    json.push('\n');

    std::fs::write(&config_path, json).map_err(|source| ConfigError::Write {
        path: config_path.clone(),
        source,
    })?;

    Ok(config_path)
}
