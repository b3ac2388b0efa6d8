//! Configuration loading, validation, and management for LAID.
//!
//! Loads configuration from `~/.laid/config.toml` with environment
//! variable overrides. Also owns the model catalog used by `/switch_model`,
//! which is the only piece of state written back to disk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.laid/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the OpenAI-compatible server (LM Studio by default)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for chat requests
    #[serde(default = "default_model")]
    pub current_model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Maximum model requests per user turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Per-tool execution timeout
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Override the built-in system instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Additional or overriding mode prompts, keyed by mode name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub modes: BTreeMap<String, String>,

    /// Models offered by `/switch_model`
    #[serde(default)]
    pub available_models: Vec<ModelEntry>,
}

fn default_base_url() -> String {
    "http://localhost:1234/v1".into()
}
fn default_model() -> String {
    "google/gemma-3-4b".into()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_max_tool_rounds() -> u32 {
    25
}
fn default_tool_timeout_secs() -> u64 {
    30
}

/// One entry of the model catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Model ID as the server knows it
    pub id: String,

    /// Display name
    pub name: String,
}

impl ModelEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl AppConfig {
    /// Load from a specific path, then apply environment overrides.
    ///
    /// Environment overrides (highest priority):
    /// - `LAID_BASE_URL`
    /// - `LAID_MODEL`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if let Ok(base_url) = std::env::var("LAID_BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(model) = std::env::var("LAID_MODEL") {
            config.current_model = model;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration back to disk, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".laid")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "max_tool_rounds must be at least 1".into(),
            ));
        }

        if self.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError("base_url must not be empty".into()));
        }

        Ok(())
    }

    /// Resolve a `/switch_model` selector: a 1-based catalog position or a model ID.
    pub fn resolve_model(&self, selector: &str) -> Option<&ModelEntry> {
        if let Ok(position) = selector.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|i| self.available_models.get(i));
        }
        self.available_models.iter().find(|m| m.id == selector)
    }

    /// Make the selected catalog model current.
    pub fn switch_model(&mut self, selector: &str) -> Result<ModelEntry, ConfigError> {
        let entry = self
            .resolve_model(selector)
            .cloned()
            .ok_or_else(|| ConfigError::ModelNotFound(selector.to_string()))?;
        self.current_model = entry.id.clone();
        Ok(entry)
    }

    /// Switch the model recorded in the file at `path` and write it back.
    ///
    /// Works on the file contents rather than the running configuration so
    /// environment overrides are never persisted.
    pub fn persist_model_switch(path: &Path, selector: &str) -> Result<ModelEntry, ConfigError> {
        let mut on_disk = Self::load_from(path)?;
        let entry = on_disk.switch_model(selector)?;
        on_disk.save_to(path)?;
        tracing::info!(model = %entry.id, path = %path.display(), "Saved current model");
        Ok(entry)
    }

    /// Display name of the current model, falling back to its ID.
    pub fn current_model_name(&self) -> &str {
        self.available_models
            .iter()
            .find(|m| m.id == self.current_model)
            .map(|m| m.name.as_str())
            .unwrap_or(&self.current_model)
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            current_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_tool_rounds: default_max_tool_rounds(),
            tool_timeout_secs: default_tool_timeout_secs(),
            instructions: None,
            modes: BTreeMap::new(),
            available_models: vec![ModelEntry::new(default_model(), "Gemma 3 4B")],
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),
}
