//! Configuration management for WebRAG.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.webrag/config.yaml` or `WEBRAG_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Runtime state (the SQLite index, prompt overrides) lives under the data
//! directory, `.webrag/` by default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Completion providers the workspace knows how to build.
pub const KNOWN_PROVIDERS: [&str; 3] = ["groq", "openai", "ollama"];

/// Crawl service backends.
pub const KNOWN_CRAWLERS: [&str; 2] = ["firecrawl", "http"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the vector index and prompt overrides
    pub data_dir: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Completion provider ("groq", "openai", "ollama")
    pub provider: String,

    /// Completion model identifier
    pub model: String,

    /// Custom completion endpoint (provider default when absent)
    pub llm_endpoint: Option<String>,

    /// API key for the completion provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Crawl service backend; resolved from available credentials when unset
    pub crawler: Option<String>,

    /// API key for the hosted crawl service
    #[serde(skip_serializing)]
    pub firecrawl_api_key: Option<String>,

    /// Custom crawl service endpoint
    pub firecrawl_endpoint: Option<String>,

    /// Crawling and chunking settings
    pub crawl: CrawlSettings,

    /// Embedding settings
    pub embedding: EmbeddingSettings,

    /// Retrieval and context selection settings
    pub retrieval: RetrievalSettings,

    /// Completion sampling settings
    pub generation: GenerationSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Crawl scope and chunking parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrawlSettings {
    /// Maximum pages per crawl, seed included
    pub max_pages: usize,

    /// Link depth ceiling for the keyless crawler
    pub max_depth: u32,

    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks of a page
    pub chunk_overlap: usize,

    /// Pause before each discovered page, for rate limits
    pub page_delay_ms: u64,

    /// Glob patterns (`*` wildcard) for non-content pages to skip
    pub exclude_patterns: Vec<String>,

    /// HTTP timeout for crawl requests
    pub timeout_secs: u64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: 20,
            max_depth: 2,
            chunk_size: 500,
            chunk_overlap: 50,
            page_delay_ms: 1000,
            exclude_patterns: vec![
                "*/privacy-policy*".to_string(),
                "*/terms-of-service*".to_string(),
                "*/login*".to_string(),
                "*/signup*".to_string(),
            ],
            timeout_secs: 30,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// Provider name: "ollama" or "trigram"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Vector dimensionality
    pub dimensions: usize,

    /// Texts per embedding batch
    pub batch_size: usize,

    /// Custom provider endpoint
    pub endpoint: Option<String>,

    /// HTTP timeout for embedding requests
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            batch_size: 100,
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

/// Retrieval and context selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalSettings {
    /// Nearest neighbours requested and documents kept in the context
    pub top_k: usize,

    /// Minimum similarity for a chunk to enter the context
    pub similarity_threshold: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 8,
            similarity_threshold: 0.5,
        }
    }
}

/// Completion sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    /// Sampling temperature
    pub temperature: f32,

    /// Output length cap in tokens
    pub max_tokens: u32,

    /// HTTP timeout for completion requests
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    crawler: Option<CrawlerSection>,
    crawl: Option<CrawlSettings>,
    embedding: Option<EmbeddingSettings>,
    retrieval: Option<RetrievalSettings>,
    generation: Option<GenerationSettings>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CrawlerSection {
    provider: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".webrag"),
            config_file: None,
            provider: "groq".to_string(),
            model: "llama3-8b-8192".to_string(),
            llm_endpoint: None,
            api_key: None,
            crawler: None,
            firecrawl_api_key: None,
            firecrawl_endpoint: None,
            crawl: CrawlSettings::default(),
            embedding: EmbeddingSettings::default(),
            retrieval: RetrievalSettings::default(),
            generation: GenerationSettings::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment.
    ///
    /// Environment variables:
    /// - `WEBRAG_DATA_DIR`: Override data directory
    /// - `WEBRAG_CONFIG`: Path to config file
    /// - `WEBRAG_PROVIDER` / `WEBRAG_MODEL` / `WEBRAG_LLM_ENDPOINT`
    /// - `GROQ_API_KEY` / `OPENAI_API_KEY` / `WEBRAG_API_KEY`
    /// - `WEBRAG_CRAWLER`, `FIRECRAWL_API_KEY`
    /// - `WEBRAG_EMBEDDING_PROVIDER` / `WEBRAG_EMBEDDING_MODEL`
    /// - `RUST_LOG`, `NO_COLOR`
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Load configuration, with explicit data dir / config file taking
    /// precedence over their environment variables.
    pub fn load_with(data_dir: Option<&Path>, config_file: Option<&Path>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("WEBRAG_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = data_dir {
            config.data_dir = dir.to_path_buf();
        }

        if let Ok(file) = std::env::var("WEBRAG_CONFIG") {
            config.config_file = Some(PathBuf::from(file));
        }
        if let Some(file) = config_file {
            config.config_file = Some(file.to_path_buf());
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.data_dir.join("config.yaml"));

        let mut key_envs = KeyEnvs::default();
        if config_path.exists() {
            key_envs = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        config.apply_env(&key_envs);
        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    ///
    /// Returns the env var names the file asks us to read keys from.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<KeyEnvs> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut key_envs = KeyEnvs::default();

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                self.provider = provider;
            }
            if let Some(model) = llm.model {
                self.model = model;
            }
            if llm.endpoint.is_some() {
                self.llm_endpoint = llm.endpoint;
            }
            key_envs.llm = llm.api_key_env;
        }

        if let Some(crawler) = file.crawler {
            if crawler.provider.is_some() {
                self.crawler = crawler.provider;
            }
            if crawler.endpoint.is_some() {
                self.firecrawl_endpoint = crawler.endpoint;
            }
            key_envs.crawler = crawler.api_key_env;
        }

        if let Some(crawl) = file.crawl {
            self.crawl = crawl;
        }
        if let Some(embedding) = file.embedding {
            self.embedding = embedding;
        }
        if let Some(retrieval) = file.retrieval {
            self.retrieval = retrieval;
        }
        if let Some(generation) = file.generation {
            self.generation = generation;
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(key_envs)
    }

    /// Environment variables override the YAML config.
    fn apply_env(&mut self, key_envs: &KeyEnvs) {
        if let Ok(provider) = std::env::var("WEBRAG_PROVIDER") {
            self.provider = provider;
        }
        if let Ok(model) = std::env::var("WEBRAG_MODEL") {
            self.model = model;
        }
        if let Ok(endpoint) = std::env::var("WEBRAG_LLM_ENDPOINT") {
            self.llm_endpoint = Some(endpoint);
        }

        let llm_key_env = key_envs
            .llm
            .clone()
            .unwrap_or_else(|| default_key_env(&self.provider).to_string());
        self.api_key = std::env::var("WEBRAG_API_KEY")
            .or_else(|_| std::env::var(&llm_key_env))
            .ok();

        if let Ok(crawler) = std::env::var("WEBRAG_CRAWLER") {
            self.crawler = Some(crawler);
        }
        let crawl_key_env = key_envs
            .crawler
            .clone()
            .unwrap_or_else(|| "FIRECRAWL_API_KEY".to_string());
        self.firecrawl_api_key = std::env::var(&crawl_key_env).ok();

        if let Ok(provider) = std::env::var("WEBRAG_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Ok(model) = std::env::var("WEBRAG_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }
        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over the config file and environment.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        crawler: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if crawler.is_some() {
            self.crawler = crawler;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// The crawl backend in effect: explicit choice, else Firecrawl when a
    /// key is available, else the keyless HTTP crawler.
    pub fn crawler_provider(&self) -> &str {
        match self.crawler.as_deref() {
            Some(crawler) => crawler,
            None if self.firecrawl_api_key.is_some() => "firecrawl",
            None => "http",
        }
    }

    /// Path of the persistent vector index.
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("index.sqlite")
    }

    /// Ensure the data directory exists.
    pub fn ensure_data_dir(&self) -> AppResult<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir).map_err(|e| {
                AppError::Config(format!(
                    "Failed to create data directory {:?}: {}",
                    self.data_dir, e
                ))
            })?;
        }
        Ok(())
    }

    /// Validate the configuration before building any client.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider != "ollama" && self.api_key.is_none() {
            return Err(AppError::Config(format!(
                "API key not found for provider '{}' (set {} or WEBRAG_API_KEY)",
                self.provider,
                default_key_env(&provider)
            )));
        }

        let crawler = self.crawler_provider();
        if !KNOWN_CRAWLERS.contains(&crawler) {
            return Err(AppError::Config(format!(
                "Unknown crawler: {}. Supported: {}",
                crawler,
                KNOWN_CRAWLERS.join(", ")
            )));
        }
        if crawler == "firecrawl" && self.firecrawl_api_key.is_none() {
            return Err(AppError::Config(
                "Firecrawl crawler selected but FIRECRAWL_API_KEY is not set".to_string(),
            ));
        }

        if self.crawl.chunk_size == 0 || self.crawl.chunk_overlap >= self.crawl.chunk_size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.crawl.chunk_overlap, self.crawl.chunk_size
            )));
        }

        if self.crawl.max_pages == 0 {
            return Err(AppError::Config("maxPages must be at least 1".to_string()));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }

        if !(-1.0..=1.0).contains(&self.retrieval.similarity_threshold) {
            return Err(AppError::Config(format!(
                "similarityThreshold must be within [-1, 1], got {}",
                self.retrieval.similarity_threshold
            )));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(AppError::Config(format!(
                "temperature must be within [0, 2], got {}",
                self.generation.temperature
            )));
        }

        if self.embedding.dimensions == 0 || self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding dimensions and batch size must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Env var names, read from the config file, that hold API keys.
#[derive(Debug, Default)]
struct KeyEnvs {
    llm: Option<String>,
    crawler: Option<String>,
}

/// Conventional env var holding the key for a completion provider.
fn default_key_env(provider: &str) -> &'static str {
    match provider {
        "openai" => "OPENAI_API_KEY",
        _ => "GROQ_API_KEY",
    }
}
