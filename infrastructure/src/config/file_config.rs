//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use the application parameter
//! objects where appropriate.

use finsight_application::config::{OrchestratorParams, RetrievalParams, ValidatorParams};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("timeout_secs cannot be 0")]
    InvalidTimeout,

    #[error("base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("model name cannot be empty")]
    EmptyModelName,
}

/// Model backend settings from TOML
///
/// Points at any OpenAI-compatible endpoint. The default targets a local
/// server and needs no API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Bearer token, if the endpoint requires one
    pub api_key: Option<String>,
    /// Chat completion model name
    pub model: String,
    /// Embedding model name
    pub embedding_model: String,
    /// Per-request deadline in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: None,
            model: "llama3.1".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Model backend settings
    pub backend: BackendConfig,
    /// Orchestration loop settings
    pub orchestrator: OrchestratorParams,
    /// Evidence validation settings
    pub validator: ValidatorParams,
    /// Retrieval strategy settings
    pub retrieval: RetrievalParams,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.backend.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBaseUrl);
        }
        if self.backend.model.trim().is_empty() || self.backend.embedding_model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        Ok(())
    }
}
