//! Configuration loading, validation, and management for RAG skills.
//!
//! Loads configuration from `~/.ragskills/config.toml` with environment
//! variable overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.ragskills/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// API key for the completion provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model used to answer questions
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Temperature for answers
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Context window and fitting behavior
    #[serde(default)]
    pub context: ContextConfig,

    /// Summarization fallback settings
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.0
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for SkillsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillsConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("context", &self.context)
            .field("summarizer", &self.summarizer)
            .field("retrieval", &self.retrieval)
            .finish()
    }
}

/// What to do when the context overflows and summarization cannot help.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Surface the error to the caller.
    Propagate,
    /// Hard-truncate the raw concatenation at the budget.
    #[default]
    Truncate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Model context window in tokens
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Tokens held back for the model's answer
    #[serde(default = "default_answer_reserve")]
    pub answer_reserve: usize,

    /// Separator placed between chunks
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Characters per token for the heuristic estimator
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f64,

    /// Summary estimates above `budget * mismatch_factor` are logged as an
    /// estimator/summarizer disagreement
    #[serde(default = "default_mismatch_factor")]
    pub mismatch_factor: f64,

    #[serde(default)]
    pub fallback: FallbackMode,
}

fn default_context_window() -> usize {
    4096
}
fn default_answer_reserve() -> usize {
    512
}
fn default_separator() -> String {
    "\n\n".into()
}
fn default_chars_per_token() -> f64 {
    4.0
}
fn default_mismatch_factor() -> f64 {
    2.0
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            answer_reserve: default_answer_reserve(),
            separator: default_separator(),
            chars_per_token: default_chars_per_token(),
            mismatch_factor: default_mismatch_factor(),
            fallback: FallbackMode::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Model override for summarization (usually cheaper than the answer model)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_true() -> bool {
    true
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: None,
            temperature: default_temperature(),
        }
    }
}

impl SummarizerConfig {
    /// The model to summarize with, falling back to the answer model.
    pub fn model_or<'a>(&'a self, main_model: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(main_model)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    4
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl SkillsConfig {
    /// Load configuration from the default path (~/.ragskills/config.toml).
    ///
    /// Environment overrides:
    /// - `RAGSKILLS_API_KEY`, then `OPENAI_API_KEY` (only when the file has no key)
    /// - `RAGSKILLS_MODEL`
    /// - `RAGSKILLS_CONTEXT_WINDOW`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides()?;
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

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            self.api_key = std::env::var("RAGSKILLS_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("RAGSKILLS_MODEL") {
            self.default_model = model;
        }

        if let Ok(window) = std::env::var("RAGSKILLS_CONTEXT_WINDOW") {
            self.context.context_window = window.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "RAGSKILLS_CONTEXT_WINDOW must be a positive integer, got '{window}'"
                ))
            })?;
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ragskills")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.summarizer.temperature < 0.0 || self.summarizer.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "summarizer.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !self.context.chars_per_token.is_finite() || self.context.chars_per_token <= 0.0 {
            return Err(ConfigError::ValidationError(
                "context.chars_per_token must be a finite number > 0".into(),
            ));
        }

        if self.context.answer_reserve >= self.context.context_window {
            return Err(ConfigError::ValidationError(
                "context.answer_reserve must be smaller than context.context_window".into(),
            ));
        }

        if self.context.mismatch_factor.is_nan() || self.context.mismatch_factor < 1.0 {
            return Err(ConfigError::ValidationError(
                "context.mismatch_factor must be >= 1.0".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        Self::default().to_toml()
    }
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
            default_temperature: default_temperature(),
            context: ContextConfig::default(),
            summarizer: SummarizerConfig::default(),
            retrieval: RetrievalConfig::default(),
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

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
