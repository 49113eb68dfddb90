//! Pipeline orchestration: crawl a site once, then answer questions about it.
//!
//! `initialize` propagates every failure to the caller. `answer_question`
//! never fails; errors become an unsuccessful [`Answer`].

use crate::answer::{AnswerGenerator, ContextFormatter};
use crate::crawler::WebsiteCrawler;
use crate::progress::ProgressReporter;
use crate::store::VectorStore;
use crate::types::Answer;
use tracing::{error, info, instrument};
use url::Url;
use webrag_core::{AppError, AppResult, RetrievalSettings};

/// Answer returned when no site has been indexed yet.
pub const NOT_INITIALIZED_MESSAGE: &str =
    "Please initialize the RAG pipeline with a website URL first.";

/// Collection name for a site: host (and explicit port), lowercased, with
/// every character outside `[a-z0-9]` replaced by `_`.
///
/// `https://docs.example.com/guide` and `http://docs.example.com/` share
/// `docs_example_com`.
pub fn site_identifier(url: &str) -> AppResult<String> {
    let parsed =
        Url::parse(url).map_err(|e| AppError::Config(format!("Invalid URL '{}': {}", url, e)))?;

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::Config(format!("URL '{}' has no host", url)))?;

    let authority = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    Ok(authority
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '_' })
        .collect())
}

/// Whether the pipeline has a site to answer from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Ready { site_url: String, site_id: String },
}

/// Crawl, index and answer over one website at a time.
pub struct RagPipeline {
    crawler: WebsiteCrawler,
    store: VectorStore,
    generator: AnswerGenerator,
    formatter: ContextFormatter,
    top_k: usize,
    state: PipelineState,
    progress: ProgressReporter,
}

impl RagPipeline {
    pub fn new(
        crawler: WebsiteCrawler,
        store: VectorStore,
        generator: AnswerGenerator,
        retrieval: &RetrievalSettings,
    ) -> Self {
        Self {
            crawler,
            store,
            generator,
            formatter: ContextFormatter::from(retrieval),
            top_k: retrieval.top_k,
            state: PipelineState::Uninitialized,
            progress: ProgressReporter::noop(),
        }
    }

    /// Report `answer` phase events to `progress`.
    ///
    /// Crawl and indexing progress is reported by the reporters given to the
    /// crawler and store.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, PipelineState::Ready { .. })
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Index `url` and become `Ready` for it.
    ///
    /// A host whose collection already holds records is reused as is: nothing
    /// is crawled or embedded and `0` is returned. With `reindex`, the
    /// collection is dropped and rebuilt from a fresh crawl.
    ///
    /// Returns the number of chunks stored by this call. The pipeline is only
    /// `Ready` once every step has succeeded.
    #[instrument(skip(self))]
    pub async fn initialize(&mut self, url: &str, reindex: bool) -> AppResult<usize> {
        self.state = PipelineState::Uninitialized;

        let site_id = site_identifier(url)?;
        if reindex && self.store.drop_collection(&site_id)? {
            info!("Dropped existing collection '{}'", site_id);
        }
        self.store.create_collection(&site_id)?;

        let existing = self.store.collection_count()?;
        if existing > 0 {
            info!(
                "Reusing collection '{}' with {} records; not crawling {}",
                site_id, existing, url
            );
            self.state = PipelineState::Ready {
                site_url: url.to_string(),
                site_id,
            };
            return Ok(0);
        }

        let chunks = self.crawler.crawl(url).await?;
        let stored = self.store.embed_and_store(&chunks).await?;

        info!("Indexed {} chunks from {} into '{}'", stored, url, site_id);
        self.state = PipelineState::Ready {
            site_url: url.to_string(),
            site_id,
        };
        Ok(stored)
    }

    /// Become `Ready` for an already indexed site without crawling.
    ///
    /// Fails with a call-order error when the site has no records yet.
    #[instrument(skip(self))]
    pub fn resume(&mut self, url: &str) -> AppResult<usize> {
        self.state = PipelineState::Uninitialized;

        let site_id = site_identifier(url)?;
        if !self.store.select_collection(&site_id)? {
            return Err(AppError::Configuration(format!(
                "Site '{}' has not been indexed; initialize it first",
                site_id
            )));
        }

        let count = self.store.collection_count()?;
        if count == 0 {
            return Err(AppError::Configuration(format!(
                "Collection '{}' is empty; initialize the site again",
                site_id
            )));
        }

        info!("Resumed '{}' with {} records", site_id, count);
        self.state = PipelineState::Ready {
            site_url: url.to_string(),
            site_id,
        };
        Ok(count)
    }

    /// Answer `query` from the indexed site.
    pub async fn answer_question(&self, query: &str) -> Answer {
        if !self.is_ready() {
            return Answer::failed(NOT_INITIALIZED_MESSAGE);
        }

        match self.try_answer(query).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Failed to answer question: {}", e);
                Answer::failed(format!("An error occurred: {}", e))
            }
        }
    }

    async fn try_answer(&self, query: &str) -> AppResult<Answer> {
        let results = self.store.search(query, self.top_k).await?;
        self.progress.answer(results.len() as u64);

        let context = self.formatter.format_context(&results);
        let answer = self.generator.get_answer(query, &context).await?;

        Ok(Answer::answered(answer, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_identifier_normalises_host() {
        assert_eq!(
            site_identifier("https://Docs.Example.com/guide?x=1").unwrap(),
            "docs_example_com"
        );
        assert_eq!(
            site_identifier("http://docs.example.com/").unwrap(),
            "docs_example_com"
        );
    }

    #[test]
    fn test_site_identifier_keeps_port() {
        assert_eq!(
            site_identifier("http://localhost:8080/").unwrap(),
            "localhost_8080"
        );
        assert_eq!(site_identifier("https://a-b.io:443/").unwrap(), "a_b_io");
    }

    #[test]
    fn test_site_identifier_rejects_bad_urls() {
        assert!(matches!(
            site_identifier("not a url").unwrap_err(),
            AppError::Config(_)
        ));
        assert!(matches!(
            site_identifier("mailto:team@example.com").unwrap_err(),
            AppError::Config(_)
        ));
    }
}
