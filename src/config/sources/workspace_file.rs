//! Workspace config files: `config/config.toml`, then `config/{VEIL_ENV}.toml`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_NAME_VAR: &str = "VEIL_ENV";
const DEFAULT_ENV_NAME: &str = "development";

/// Workspace files in precedence order, lowest first.
pub fn workspace_files(workspace_root: &Path) -> [PathBuf; 2] {
    let env_name = std::env::var(ENV_NAME_VAR)
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENV_NAME.to_string());
    let config_dir = workspace_root.join("config");
    [
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", env_name)),
    ]
}

/// Layer whichever workspace files exist onto the builder.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(workspace_files(workspace_root)
        .iter()
        .fold(builder, |builder, path| {
            if path.is_file() {
                builder.add_source(File::from(path.as_path()).required(false))
            } else {
                debug!(config_path = %path.display(), "Workspace config file not present");
                builder
            }
        }))
}
