//! Built-in defaults applied beneath every file and environment source.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};
use directories::ProjectDirs;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// `$XDG_DATA_HOME/coursetree/store` when a home directory is known.
pub fn default_store_path() -> PathBuf {
    ProjectDirs::from("", "", "coursetree")
        .map(|dirs| dirs.data_dir().join("store"))
        .unwrap_or_else(|| PathBuf::from(".coursetree/store"))
}

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default(
            "storage.path",
            default_store_path().to_string_lossy().into_owned(),
        )?
        .set_default("provider.base_url", DEFAULT_BASE_URL)?
        .set_default("provider.model", DEFAULT_MODEL)?
        .set_default("provider.api_key_env", DEFAULT_API_KEY_ENV)?
        .set_default("provider.temperature", 0.0)?
        .set_default("provider.timeout_secs", 120)?
        .set_default("generation.max_depth", 3)?
        .set_default("generation.category", "generic")
}
