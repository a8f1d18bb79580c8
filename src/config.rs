//! Configuration file handling.
//!
//! This module handles loading configuration from `.filinglens.toml` files:
//! per-dependency rate limits and retry policy, provider settings, and the
//! degradation constants used when summarization is exhausted.

use crate::coordinator::ServiceLimits;
use crate::provider::OllamaConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Provider settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Per-dependency rate limits and retry policy.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Degradation constants and summarization retry policy.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout() -> u64 {
    300
}

impl From<&ModelConfig> for OllamaConfig {
    fn from(config: &ModelConfig) -> Self {
        Self {
            url: config.ollama_url.clone(),
            model: config.name.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        }
    }
}

/// Rate limits for both governed dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Text-generation dependency.
    #[serde(default = "default_llm_limits")]
    pub llm: DependencyLimits,

    /// Filing data source dependency.
    #[serde(default = "default_edgar_limits")]
    pub edgar: DependencyLimits,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            llm: default_llm_limits(),
            edgar: default_edgar_limits(),
        }
    }
}

/// Sliding-window budgets and retry policy for one dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyLimits {
    /// Calls admitted per minute.
    pub calls_per_minute: usize,
    /// Calls admitted per hour.
    pub calls_per_hour: usize,
    /// Retries after the first attempt.
    pub max_retries: usize,
    /// Base backoff delay in milliseconds; doubles per attempt.
    pub base_delay_ms: u64,
}

impl DependencyLimits {
    /// Converts to the coordinator's limit type.
    pub fn to_service_limits(&self) -> ServiceLimits {
        ServiceLimits {
            calls_per_minute: self.calls_per_minute,
            calls_per_hour: self.calls_per_hour,
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

fn default_llm_limits() -> DependencyLimits {
    DependencyLimits {
        calls_per_minute: 60,
        calls_per_hour: 1000,
        max_retries: 3,
        base_delay_ms: 1000,
    }
}

fn default_edgar_limits() -> DependencyLimits {
    DependencyLimits {
        calls_per_minute: 10,
        calls_per_hour: 500,
        max_retries: 3,
        base_delay_ms: 2000,
    }
}

/// Summarization retry policy and degradation constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Confidence reported when overall summarization is exhausted.
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,

    /// Attempts for section and overall summarization.
    #[serde(default = "default_summary_max_attempts")]
    pub summary_max_attempts: usize,

    /// Base backoff delay for summarization retries, in milliseconds.
    #[serde(default = "default_summary_base_delay_ms")]
    pub summary_base_delay_ms: u64,

    /// Character budget for text embedded in a prompt.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fallback_confidence: default_fallback_confidence(),
            summary_max_attempts: default_summary_max_attempts(),
            summary_base_delay_ms: default_summary_base_delay_ms(),
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

impl AnalysisConfig {
    /// Base backoff delay for summarization retries.
    pub fn summary_base_delay(&self) -> Duration {
        Duration::from_millis(self.summary_base_delay_ms)
    }
}

fn default_fallback_confidence() -> f64 {
    0.8
}

fn default_summary_max_attempts() -> usize {
    3
}

fn default_summary_base_delay_ms() -> u64 {
    500
}

fn default_max_prompt_chars() -> usize {
    24_000
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but
    /// can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".filinglens.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
