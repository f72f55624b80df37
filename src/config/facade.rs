//! Config loading facade: assembles the layered sources and deserializes `VeilConfig`.

use crate::config::merge::builder_with_defaults;
use crate::config::sources::{env, global_file, workspace_file};
use crate::config::VeilConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence, lowest first: built-in defaults, global file, workspace
    /// `config/config.toml`, workspace `config/{VEIL_ENV}.toml`, `VEIL_*` environment.
    pub fn load(workspace_root: &Path) -> Result<VeilConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = env::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }

    /// Load a single file on top of the defaults and the environment.
    pub fn load_from_file(path: &Path) -> Result<VeilConfig, ConfigError> {
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        let builder = env::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    pub fn config_home() -> Option<PathBuf> {
        global_file::config_home()
    }

    pub fn default() -> VeilConfig {
        VeilConfig::default()
    }
}
