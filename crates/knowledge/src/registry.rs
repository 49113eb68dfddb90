//! Process-wide cache of pipelines keyed by the credentials they run with.
//!
//! Keys are SHA-256 digests; raw API keys are never stored as map keys or
//! logged.

use crate::pipeline::RagPipeline;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;
use webrag_core::AppResult;

/// Shared handle to a cached pipeline.
pub type SharedPipeline = Arc<Mutex<RagPipeline>>;

/// Credentials that determine which external accounts a pipeline uses.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub llm_provider: String,
    pub llm_api_key: Option<String>,
    pub crawler: String,
    pub crawler_api_key: Option<String>,
}

impl ProviderCredentials {
    /// Hex SHA-256 over every field, unambiguously delimited.
    pub fn identity(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            Some(self.llm_provider.as_str()),
            self.llm_api_key.as_deref(),
            Some(self.crawler.as_str()),
            self.crawler_api_key.as_deref(),
        ] {
            match field {
                Some(value) => {
                    hasher.update([1u8]);
                    hasher.update((value.len() as u64).to_le_bytes());
                    hasher.update(value.as_bytes());
                }
                None => hasher.update([0u8]),
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("llm_provider", &self.llm_provider)
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "<redacted>"))
            .field("crawler", &self.crawler)
            .field("crawler_api_key", &self.crawler_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Map from credential identity to a lazily built pipeline.
#[derive(Default)]
pub struct PipelineRegistry {
    pipelines: Mutex<HashMap<String, SharedPipeline>>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by the whole process.
    pub fn global() -> &'static PipelineRegistry {
        static REGISTRY: OnceLock<PipelineRegistry> = OnceLock::new();
        REGISTRY.get_or_init(PipelineRegistry::new)
    }

    /// Return the pipeline for `credentials`, building it on first use.
    ///
    /// `build` runs at most once per identity; a failed build caches nothing.
    pub async fn get_or_try_init<F, Fut>(
        &self,
        credentials: &ProviderCredentials,
        build: F,
    ) -> AppResult<SharedPipeline>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<RagPipeline>>,
    {
        let key = credentials.identity();
        let mut pipelines = self.pipelines.lock().await;

        if let Some(existing) = pipelines.get(&key) {
            tracing::debug!("Reusing cached pipeline {}", &key[..12]);
            return Ok(existing.clone());
        }

        let pipeline = Arc::new(Mutex::new(build().await?));
        pipelines.insert(key.clone(), pipeline.clone());
        tracing::info!("Cached new pipeline {}", &key[..12]);
        Ok(pipeline)
    }

    pub async fn len(&self) -> usize {
        self.pipelines.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pipelines.lock().await.is_empty()
    }

    /// Drop every cached pipeline.
    pub async fn clear(&self) {
        self.pipelines.lock().await.clear();
    }
}
