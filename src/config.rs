//! Configuration
//!
//! Layered configuration built on the `config` crate. Precedence, lowest first:
//! built-in defaults, the global file at `$XDG_CONFIG_HOME/coursetree/config.toml`,
//! an explicitly named file, then `COURSETREE__SECTION__KEY` environment variables.

use crate::generation::{CourseCategory, GenerationPlan};
use crate::logging::LoggingConfig;
use config::{ConfigError, Environment};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod merge {
    pub(super) mod merge_policy;
}
mod sources {
    pub(super) mod explicit_file;
    pub(super) mod global_file;
}

pub use merge::merge_policy::default_store_path;
pub use sources::global_file::global_config_path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CourseTreeConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub generation: GenerationDefaults,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the sled database.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    /// Inline key; prefer `api_key_env` outside of tests.
    #[serde(default)]
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: merge::merge_policy::DEFAULT_BASE_URL.to_string(),
            model: merge::merge_policy::DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: merge::merge_policy::DEFAULT_API_KEY_ENV.to_string(),
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

impl ProviderConfig {
    /// Inline key first, then the named environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.is_empty())
    }
}

/// Plan fields used when the caller does not supply them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationDefaults {
    pub max_depth: usize,
    #[serde(default)]
    pub item_cap: Option<usize>,
    #[serde(default)]
    pub category: CourseCategory,
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            max_depth: 3,
            item_cap: None,
            category: CourseCategory::Generic,
            instructions: Vec::new(),
        }
    }
}

impl GenerationDefaults {
    pub fn plan(&self, title: impl Into<String>, description: impl Into<String>) -> GenerationPlan {
        let mut plan = GenerationPlan::new(title, self.max_depth);
        plan.description = description.into();
        plan.category = self.category;
        plan.item_cap = self.item_cap;
        plan.instructions = self.instructions.clone();
        plan
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("storage: {0}")]
    Storage(String),
    #[error("provider: {0}")]
    Provider(String),
    #[error("generation: {0}")]
    Generation(String),
}

impl CourseTreeConfig {
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        if self.storage.path.as_os_str().is_empty() {
            errors.push(ConfigValidationError::Storage(
                "Store path cannot be empty".to_string(),
            ));
        }

        if self.provider.model.trim().is_empty() {
            errors.push(ConfigValidationError::Provider(
                "Model cannot be empty".to_string(),
            ));
        }
        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            errors.push(ConfigValidationError::Provider(format!(
                "Base URL must be http(s): {}",
                self.provider.base_url
            )));
        }
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            errors.push(ConfigValidationError::Provider(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.provider.temperature
            )));
        }

        if let Err(err) = self.generation.plan("config", "").validate() {
            errors.push(ConfigValidationError::Generation(err.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(explicit: Option<&Path>) -> Result<CourseTreeConfig, ConfigError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder)?;
        if let Some(path) = explicit {
            builder = sources::explicit_file::add_to_builder(builder, path)?;
        }
        builder
            .add_source(
                Environment::with_prefix("COURSETREE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
