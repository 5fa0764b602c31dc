//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::AegisError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AegisConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub stream: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            stream: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,
    #[serde(default = "default_guidelines_file")]
    pub guidelines_file: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            guidelines_file: default_guidelines_file(),
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

impl AegisConfig {
    pub fn validate(&self) -> Result<(), AegisError> {
        let base_url = &self.generation.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AegisError::ConfigError(format!(
                "generation.base_url must be an http(s) URL, got '{}'",
                base_url
            )));
        }

        if self.generation.model.trim().is_empty() {
            return Err(AegisError::ConfigError(
                "generation.model cannot be empty".to_string(),
            ));
        }

        if self.generation.timeout_secs == 0 {
            return Err(AegisError::ConfigError(
                "generation.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(AegisError::ConfigError(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.chunk_size == 0 {
            return Err(AegisError::ConfigError(
                "retrieval.chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.guidelines_file.trim().is_empty() {
            return Err(AegisError::ConfigError(
                "retrieval.guidelines_file cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Path of the policy guidelines file inside the documents folder.
    pub fn guidelines_path(&self) -> PathBuf {
        self.retrieval
            .documents_dir
            .join(&self.retrieval.guidelines_file)
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("./Input Files")
}

fn default_guidelines_file() -> String {
    "policy_guidelines.txt".to_string()
}

fn default_top_k() -> usize {
    4
}

fn default_chunk_size() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("aegis.log")
}
