//! Pipeline assembly from application configuration.

use crate::answer::AnswerGenerator;
use crate::chunker::Chunker;
use crate::crawler::{CrawlOptions, CrawlService, FirecrawlService, HttpCrawlService, WebsiteCrawler};
use crate::embeddings::{create_provider, EmbeddingConfig};
use crate::pipeline::RagPipeline;
use crate::progress::ProgressReporter;
use crate::registry::ProviderCredentials;
use crate::store::{SqliteIndex, VectorStore};
use std::sync::Arc;
use std::time::Duration;
use webrag_core::{AppConfig, AppError, AppResult};
use webrag_llm::create_client;
use webrag_prompt::{resolve_prompt, RAG_ANSWER_PROMPT_ID};

/// Create the crawl backend selected by `config`.
pub fn create_crawl_service(config: &AppConfig) -> AppResult<Arc<dyn CrawlService>> {
    let timeout = Duration::from_secs(config.crawl.timeout_secs);

    match config.crawler_provider() {
        "firecrawl" => {
            let api_key = config.firecrawl_api_key.as_deref().ok_or_else(|| {
                AppError::Config("Firecrawl crawler requires FIRECRAWL_API_KEY".to_string())
            })?;
            Ok(Arc::new(FirecrawlService::new(
                api_key,
                config.firecrawl_endpoint.as_deref(),
                timeout,
            )?))
        }
        "http" => Ok(Arc::new(HttpCrawlService::new(
            timeout,
            config.crawl.max_depth,
        )?)),
        other => Err(AppError::Config(format!(
            "Unknown crawler: '{}'. Supported crawlers: firecrawl, http",
            other
        ))),
    }
}

/// Identity of the external accounts `config` uses.
pub fn provider_credentials(config: &AppConfig) -> ProviderCredentials {
    ProviderCredentials {
        llm_provider: config.provider.to_lowercase(),
        llm_api_key: config.api_key.clone(),
        crawler: config.crawler_provider().to_string(),
        crawler_api_key: config.firecrawl_api_key.clone(),
    }
}

/// Wire crawler, embedder, index, prompt and completion client into a
/// pipeline. `progress` is shared by every stage.
pub fn build_pipeline(config: &AppConfig, progress: ProgressReporter) -> AppResult<RagPipeline> {
    config.ensure_data_dir()?;

    let crawler = WebsiteCrawler::new(
        create_crawl_service(config)?,
        Chunker::new(config.crawl.chunk_size, config.crawl.chunk_overlap)?,
        CrawlOptions::from_settings(&config.crawl)?,
    )
    .with_progress(progress.clone());

    let embedding = EmbeddingConfig::from(&config.embedding);
    let store = VectorStore::new(
        Arc::new(SqliteIndex::open(&config.index_path())?),
        create_provider(&embedding)?,
        embedding.batch_size,
    )
    .with_progress(progress.clone());

    let client = create_client(
        &config.provider,
        config.llm_endpoint.as_deref(),
        config.api_key.as_deref(),
        Duration::from_secs(config.generation.timeout_secs),
    )?;
    let prompt = resolve_prompt(&config.data_dir, RAG_ANSWER_PROMPT_ID)?;
    let generator =
        AnswerGenerator::new(client, &config.model, prompt).with_settings(&config.generation);

    tracing::debug!(
        "Built pipeline: crawler={}, embeddings={}/{}, llm={}/{}",
        config.crawler_provider(),
        embedding.provider,
        embedding.model,
        config.provider,
        config.model
    );

    Ok(RagPipeline::new(crawler, store, generator, &config.retrieval).with_progress(progress))
}
