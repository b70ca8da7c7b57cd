use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub wikidata: WikidataConfig,
    pub embeddings: EmbeddingsConfig,
    pub linking: LinkingConfig,
    pub tables: TablesConfig,
}

/// Wikidata endpoints and retry policy
#[derive(Debug, Clone, Deserialize)]
pub struct WikidataConfig {
    #[serde(default = "default_sparql_url")]
    pub sparql_url: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
    /// Stable identity sent on resolution calls.
    pub user_agent: String,
    /// Pool drawn from at random on bulk SPARQL calls to reduce throttling.
    #[serde(default)]
    pub rotating_user_agents: Vec<String>,
}

/// Embedding service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub endpoint: String,
    pub model: String,
    pub dimensions: usize,
    /// Environment variable holding the bearer token, if the service needs one.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

/// Relation-linking parameters
#[derive(Debug, Clone, Deserialize)]
pub struct LinkingConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    pub similarity_threshold: f32,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    #[serde(default = "default_cache_capacity")]
    pub superclass_cache_capacity: usize,
}

/// Precomputed property/constraint table locations
#[derive(Debug, Clone, Deserialize)]
pub struct TablesConfig {
    pub properties_path: PathBuf,
    pub constraints_path: PathBuf,
}

fn default_sparql_url() -> String {
    "https://query.wikidata.org/sparql".to_string()
}

fn default_api_url() -> String {
    "https://www.wikidata.org/w/api.php".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

fn default_base_delay_secs() -> u64 {
    5
}

fn default_top_k() -> usize {
    5
}

fn default_max_depth() -> usize {
    3
}

fn default_language() -> String {
    "en".to_string()
}

fn default_search_limit() -> usize {
    5
}

fn default_cache_capacity() -> usize {
    1000
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in KGLINK_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config_path = std::env::var("KGLINK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.wikidata.max_retries == 0 {
            anyhow::bail!("wikidata.max_retries must be greater than 0");
        }

        if self.wikidata.user_agent.trim().is_empty() {
            anyhow::bail!("wikidata.user_agent must not be empty");
        }

        if self.linking.top_k == 0 {
            anyhow::bail!("linking.top_k must be greater than 0");
        }

        if self.linking.similarity_threshold < 0.0 || self.linking.similarity_threshold > 1.0 {
            anyhow::bail!("linking.similarity_threshold must be between 0.0 and 1.0");
        }

        if self.linking.search_limit == 0 {
            anyhow::bail!("linking.search_limit must be greater than 0");
        }

        if self.embeddings.dimensions == 0 {
            anyhow::bail!("embeddings.dimensions must be greater than 0");
        }

        // Bearer token is resolved at client construction; here we only check
        // that a configured variable is actually set (dotenv already loaded).
        if let Some(env_name) = &self.embeddings.api_key_env {
            std::env::var(env_name).with_context(|| {
                format!(
                    "Environment variable {} not set. Set it in your .env file or as an environment variable.",
                    env_name
                )
            })?;
        }

        for (name, path) in [
            ("tables.properties_path", &self.tables.properties_path),
            ("tables.constraints_path", &self.tables.constraints_path),
        ] {
            if !path.exists() {
                anyhow::bail!("{} does not exist: {}", name, path.display());
            }
        }

        Ok(())
    }

    /// Request timeout for all outbound HTTP calls
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.wikidata.timeout_secs)
    }

    /// Sleep between retry attempts grows linearly: base_delay * attempt
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.wikidata.base_delay_secs)
    }

    pub fn properties_path(&self) -> &Path {
        &self.tables.properties_path
    }

    pub fn constraints_path(&self) -> &Path {
        &self.tables.constraints_path
    }
}
