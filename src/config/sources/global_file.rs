//! Global config file source: $XDG_CONFIG_HOME/coursetree/config.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::debug;

pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "coursetree").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Add the global config file if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match global_config_path() {
        Some(path) if path.exists() => Ok(builder.add_source(File::from(path).required(false))),
        Some(path) => {
            debug!(config_path = %path.display(), "No global configuration file");
            Ok(builder)
        }
        None => Ok(builder),
    }
}
