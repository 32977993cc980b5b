
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Environment variable holding the embedding provider credential.
/// The key is injected once at client construction and never persisted.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub model: String,
    pub dimensions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Over-fetch factor for the approximate index: `num_candidates` is this
    /// many times the requested result limit.
    pub candidate_multiplier: u32,
    /// Result page size used when the caller does not request a limit.
    pub default_limit: usize,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSION,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            candidate_multiplier: 3,
            default_limit: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            search: SearchConfig::default(),
            base_dir: crate::config::get_config_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid API base URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid embedding dimension: {0} (must be between 64 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid candidate multiplier: {0} (must be between 1 and 100)")]
    InvalidCandidateMultiplier(u32),
    #[error("Invalid result limit: {0} (must be between 1 and 1000)")]
    InvalidResultLimit(usize),
    #[error("Missing API key: set the {API_KEY_ENV} environment variable")]
    MissingApiKey,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load configuration from the default config directory.
    #[inline]
    pub fn load() -> Result<Self> {
        let config_dir = crate::config::get_config_dir()?;
        Self::load_from(config_dir)
    }

    /// Load configuration from a specific directory, falling back to defaults
    /// when no config file exists there.
    #[inline]
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                openai: OpenAiConfig::default(),
                search: SearchConfig::default(),
                base_dir: config_dir.as_ref().to_path_buf(),
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Get the base directory for the application
    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.openai.validate()?;
        self.search.validate()?;
        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    /// Get the path for the SQLite database
    #[inline]
    pub fn database_path(&self) -> PathBuf {
        self.get_base_dir().join("jobs.db")
    }

    /// Get the path for the vector database directory
    #[inline]
    pub fn vector_database_path(&self) -> PathBuf {
        self.get_base_dir().join("vectors")
    }
}

impl OpenAiConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.api_base).map_err(|_| ConfigError::InvalidUrl(self.api_base.clone()))?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if !(64..=4096).contains(&self.dimensions) {
            return Err(ConfigError::InvalidEmbeddingDimension(self.dimensions));
        }

        Ok(())
    }

    #[inline]
    pub fn api_base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api_base).map_err(|_| ConfigError::InvalidUrl(self.api_base.clone()))
    }

    /// Read the provider credential from the environment.
    #[inline]
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    #[inline]
    pub fn set_api_base(&mut self, api_base: String) -> Result<(), ConfigError> {
        Url::parse(&api_base).map_err(|_| ConfigError::InvalidUrl(api_base.clone()))?;
        self.api_base = api_base;
        Ok(())
    }

    #[inline]
    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }

    #[inline]
    pub fn set_dimensions(&mut self, dimensions: u32) -> Result<(), ConfigError> {
        if !(64..=4096).contains(&dimensions) {
            return Err(ConfigError::InvalidEmbeddingDimension(dimensions));
        }
        self.dimensions = dimensions;
        Ok(())
    }
}

impl SearchConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candidate_multiplier == 0 || self.candidate_multiplier > 100 {
            return Err(ConfigError::InvalidCandidateMultiplier(
                self.candidate_multiplier,
            ));
        }

        if self.default_limit == 0 || self.default_limit > 1000 {
            return Err(ConfigError::InvalidResultLimit(self.default_limit));
        }

        Ok(())
    }

    #[inline]
    pub fn set_candidate_multiplier(&mut self, multiplier: u32) -> Result<(), ConfigError> {
        if multiplier == 0 || multiplier > 100 {
            return Err(ConfigError::InvalidCandidateMultiplier(multiplier));
        }
        self.candidate_multiplier = multiplier;
        Ok(())
    }

    #[inline]
    pub fn set_default_limit(&mut self, limit: usize) -> Result<(), ConfigError> {
        if limit == 0 || limit > 1000 {
            return Err(ConfigError::InvalidResultLimit(limit));
        }
        self.default_limit = limit;
        Ok(())
    }
}
