//! Configuration loader for YAML files and environment overrides
//!
//! Values are resolved in three layers: built-in defaults, the YAML file, then
//! `AEGIS_*` environment variables. Command-line flags are applied on top by
//! the binary.

use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::types::AegisConfig;
use crate::errors::AegisError;

pub const ENV_OLLAMA_URL: &str = "AEGIS_OLLAMA_URL";
pub const ENV_MODEL: &str = "AEGIS_MODEL";
pub const ENV_DOCUMENTS_DIR: &str = "AEGIS_DOCUMENTS_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<AegisConfig, AegisError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            AegisError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<AegisConfig, AegisError> {
        let mut config: AegisConfig = if content.trim().is_empty() {
            AegisConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| {
                AegisError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?
        };

        Self::apply_environment(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Load the given file, or the default location, falling back to built-in
    /// defaults when no file exists.
    ///
    /// An explicitly requested file that does not exist is an error.
    pub async fn load_or_default(path: Option<&Path>) -> Result<AegisConfig, AegisError> {
        if let Some(path) = path {
            log::info!("Loading configuration from file: {}", path.display());
            return Self::from_file(path).await;
        }

        if let Some(default_path) = Self::default_path() {
            if default_path.exists() {
                log::info!(
                    "Loading configuration from default location: {}",
                    default_path.display()
                );
                return Self::from_file(default_path).await;
            }
        }

        log::info!("No configuration file found, using defaults");
        let mut config = AegisConfig::default();
        Self::apply_environment(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/aegis/aegis.yaml` for the current platform
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aegis").join("aegis.yaml"))
    }

    pub fn apply_environment(config: &mut AegisConfig) {
        if let Some(url) = non_empty_var(ENV_OLLAMA_URL) {
            log::debug!("Overriding generation.base_url from {}", ENV_OLLAMA_URL);
            config.generation.base_url = url;
        }
        if let Some(model) = non_empty_var(ENV_MODEL) {
            log::debug!("Overriding generation.model from {}", ENV_MODEL);
            config.generation.model = model;
        }
        if let Some(dir) = non_empty_var(ENV_DOCUMENTS_DIR) {
            log::debug!("Overriding retrieval.documents_dir from {}", ENV_DOCUMENTS_DIR);
            config.retrieval.documents_dir = PathBuf::from(dir);
        }
    }

    pub fn to_yaml(config: &AegisConfig) -> Result<String, AegisError> {
        serde_yaml::to_string(config)
            .map_err(|e| AegisError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
