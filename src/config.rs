//! Configuration management for SiteBuddy
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: explicit `--config` path, else ~/.sitebuddy/config.toml,
//! else built-in defaults. `LLM_TOKEN`, `LLM_URL` and `LLM_MODEL` override
//! the `[llm]` section after loading.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::embedding::{DEFAULT_DIMENSION, DEFAULT_MODEL_ID};
use crate::errors::{Result, SiteError};
use crate::llm::GenerationParams;
use crate::rag::answer::CitationStyle;
use crate::rag::retriever::SearchParams;

/// Complete configuration for SiteBuddy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub assistant: AssistantConfig,
    pub llm: LlmConfig,
    pub generation: GenerationConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub paths: PathsConfig,
}

/// Who the assistant speaks for and how answers are rendered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub company: String,
    pub site_url: String,
    pub language: String,
    pub citation_style: CitationStyle,
}

/// OpenAI-compatible chat endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// Sampling parameters sent with every completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

/// Retrieval defaults for answering
///
/// A `[retrieval]` table without `min_score` disables the threshold; a
/// missing table keeps the default threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f32>,
}

/// Sentence encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model_id: String,
    pub dimension: usize,
    pub batch_size: usize,
    pub workers: usize,
}

/// File system paths configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub content: String,
    pub index: String,
    pub log_dir: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            company: "EORA".to_string(),
            site_url: "https://eora.ru/".to_string(),
            language: "Russian".to_string(),
            citation_style: CitationStyle::Html,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.5,
            top_p: 0.8,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            min_score: Some(0.3),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            dimension: DEFAULT_DIMENSION,
            batch_size: 32,
            workers: num_cpus::get(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: "data/content.json".to_string(),
            index: "data/index.bin".to_string(),
            log_dir: "data/logs".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults, then apply env overrides
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(config_path) = path {
            Self::load_from_file(&config_path)?
        } else {
            Self::load_default()?
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SiteError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| SiteError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// ~/.sitebuddy/config.toml
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".sitebuddy").join("config.toml"))
    }

    /// Apply `LLM_*` overrides from a variable lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("LLM_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.llm.api_key = Some(token);
        }
        if let Some(url) = lookup("LLM_URL").filter(|v| !v.trim().is_empty()) {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("LLM_MODEL").filter(|v| !v.trim().is_empty()) {
            self.llm.model = model;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(SiteError::ConfigError(
                "top_k must be greater than 0".to_string()
            ));
        }

        if let Some(min_score) = self.retrieval.min_score {
            if !min_score.is_finite() || !(-1.0..=1.0).contains(&min_score) {
                return Err(SiteError::ConfigError(
                    "min_score must be between -1.0 and 1.0".to_string()
                ));
            }
        }

        if self.generation.max_tokens == 0 {
            return Err(SiteError::ConfigError(
                "max_tokens must be greater than 0".to_string()
            ));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(SiteError::ConfigError(
                "temperature must be between 0.0 and 2.0".to_string()
            ));
        }

        if !(self.generation.top_p > 0.0 && self.generation.top_p <= 1.0) {
            return Err(SiteError::ConfigError(
                "top_p must be in (0.0, 1.0]".to_string()
            ));
        }

        if self.embedding.dimension == 0 || self.embedding.batch_size == 0 || self.embedding.workers == 0 {
            return Err(SiteError::ConfigError(
                "embedding dimension, batch_size and workers must be greater than 0".to_string()
            ));
        }

        if self.llm.base_url.trim().is_empty() {
            return Err(SiteError::ConfigError("llm.base_url must not be empty".to_string()));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| SiteError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SiteError::ConfigError(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SiteError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn content_path(&self) -> PathBuf {
        Self::expand_path(&self.paths.content)
    }

    pub fn index_path(&self) -> PathBuf {
        Self::expand_path(&self.paths.index)
    }

    pub fn log_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.log_dir)
    }

    /// Retrieval parameters used when answering
    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            top_k: self.retrieval.top_k,
            min_score: self.retrieval.min_score,
        }
    }

    /// Sampling parameters for the model call
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.generation.max_tokens,
            temperature: self.generation.temperature,
            top_p: self.generation.top_p,
        }
    }
}
