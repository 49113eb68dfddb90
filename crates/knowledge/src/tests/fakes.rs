//! Deterministic stand-ins for the network-bound collaborators.

use crate::crawler::CrawlService;
use crate::embeddings::EmbeddingProvider;
use crate::types::FetchedPage;
use std::collections::HashMap;
use std::sync::Mutex;
use webrag_core::{AppError, AppResult};
use webrag_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};

/// Serves pages from a table; unknown URLs and `failing` URLs error.
#[derive(Default)]
pub struct ScriptedCrawlService {
    pages: HashMap<String, FetchedPage>,
    failing: Vec<String>,
    links: Option<Vec<String>>,
    pub fetched: Mutex<Vec<String>>,
}

impl ScriptedCrawlService {
    pub fn new() -> Self {
        Self {
            links: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn page(mut self, url: &str, markdown: &str, title: &str) -> Self {
        self.pages
            .insert(url.to_string(), FetchedPage::new(markdown, title));
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.push(url.to_string());
        self
    }

    pub fn links(mut self, links: &[&str]) -> Self {
        self.links = Some(links.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn discovery_fails(mut self) -> Self {
        self.links = None;
        self
    }
}

#[async_trait::async_trait]
impl CrawlService for ScriptedCrawlService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, url: &str) -> AppResult<FetchedPage> {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.failing.iter().any(|f| f == url) {
            return Err(AppError::Fetch(format!("{}: HTTP 503", url)));
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::Fetch(format!("{}: HTTP 404", url)))
    }

    async fn discover(&self, _seed_url: &str, max_count: usize) -> AppResult<Vec<String>> {
        match &self.links {
            Some(links) => Ok(links.iter().take(max_count).cloned().collect()),
            None => Err(AppError::Discovery("map endpoint unavailable".to_string())),
        }
    }
}

/// Maps text to fixed vectors by keyword, so similarities are known.
///
/// "pricing" -> x, "team" -> y, anything else -> z. "alpha", "beta" and
/// "gamma" sit in the x/y plane at cosine 0.9, 0.7 and 0.4 from x.
#[derive(Debug, Default)]
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        for (keyword, cos) in [("alpha", 0.9f32), ("beta", 0.7), ("gamma", 0.4)] {
            if lower.contains(keyword) {
                return vec![cos, (1.0 - cos * cos).sqrt(), 0.0];
            }
        }
        if lower.contains("pricing") {
            vec![1.0, 0.0, 0.0]
        } else if lower.contains("team") {
            vec![0.0, 1.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn provider_name(&self) -> &str {
        "keyword"
    }

    fn model_name(&self) -> &str {
        "keyword-3"
    }

    fn dimensions(&self) -> usize {
        3
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Records every request and answers with a fixed reply.
pub struct RecordingLlm {
    reply: Option<String>,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl RecordingLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails at the transport level.
    pub fn unavailable() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl LlmClient for RecordingLlm {
    fn provider_name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Some(content) => Ok(LlmResponse {
                content: content.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(42, 7),
                finish_reason: Some("stop".to_string()),
            }),
            None => Err(AppError::Llm("connection refused".to_string())),
        }
    }
}
