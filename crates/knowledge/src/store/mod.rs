//! Embedding-backed storage and retrieval of website chunks.
//!
//! [`VectorStore`] owns the selected collection and is the only component that
//! talks to both the embedding provider and the [`VectorIndex`].

mod index;
mod sqlite;

pub use index::{CollectionHandle, CollectionSpec, DistanceMetric, QueryResult, VectorIndex};
pub use sqlite::SqliteIndex;

use crate::embeddings::EmbeddingProvider;
use crate::progress::ProgressReporter;
use crate::types::{Chunk, ChunkMetadata, SearchResult};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use webrag_core::{AppError, AppResult};

/// Number of results `search` returns by default.
pub const DEFAULT_TOP_K: usize = 8;

/// Indexer and retriever over one selected collection at a time.
pub struct VectorStore {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    collection: Option<CollectionHandle>,
    progress: ProgressReporter,
}

impl VectorStore {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            batch_size: batch_size.max(1),
            collection: None,
            progress: ProgressReporter::noop(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Get or create the collection for `site_id` and select it.
    pub fn create_collection(&mut self, site_id: &str) -> AppResult<&CollectionHandle> {
        let handle = match self.index.get(site_id)? {
            Some(existing) => {
                self.check_embedding_space(&existing)?;
                tracing::debug!("Reusing collection '{}'", site_id);
                existing
            }
            None => self.index.create(&CollectionSpec {
                name: site_id.to_string(),
                metric: DistanceMetric::Cosine,
                dimensions: self.embedder.dimensions(),
                embedding_model: self.embedder.model_name().to_string(),
            })?,
        };

        Ok(self.collection.insert(handle))
    }

    /// Select an existing collection. Returns `false` when there is none.
    pub fn select_collection(&mut self, site_id: &str) -> AppResult<bool> {
        match self.index.get(site_id)? {
            Some(existing) => {
                self.check_embedding_space(&existing)?;
                self.collection = Some(existing);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn current_collection(&self) -> Option<&CollectionHandle> {
        self.collection.as_ref()
    }

    /// Delete the collection for `site_id`, deselecting it if selected.
    pub fn drop_collection(&mut self, site_id: &str) -> AppResult<bool> {
        if self
            .collection
            .as_ref()
            .is_some_and(|handle| handle.name == site_id)
        {
            self.collection = None;
        }
        self.index.delete(site_id)
    }

    /// Records in the selected collection.
    pub fn collection_count(&self) -> AppResult<usize> {
        let handle = self.selected("count records")?;
        self.index.count(handle)
    }

    pub fn list_collections(&self) -> AppResult<Vec<CollectionHandle>> {
        self.index.list()
    }

    /// Embed `chunks` and append them to the selected collection.
    ///
    /// Returns the number of records written.
    #[instrument(skip(self, chunks), fields(chunks = chunks.len()))]
    pub async fn embed_and_store(&self, chunks: &[Chunk]) -> AppResult<usize> {
        let handle = self.selected("store chunks")?;
        if chunks.is_empty() {
            tracing::info!("No chunks to store in '{}'", handle.name);
            return Ok(0);
        }

        let total = chunks.len() as u64;
        let batch_id = Uuid::new_v4();
        let mut stored = 0usize;

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(AppError::Knowledge(format!(
                    "Embedding provider returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }
            self.progress
                .embed((stored + batch.len()) as u64, total, self.embedder.model_name());

            let ids: Vec<String> = (stored..stored + batch.len())
                .map(|n| format!("{}-{}", batch_id, n))
                .collect();
            let metadatas: Vec<ChunkMetadata> =
                batch.iter().map(|c| c.metadata.clone()).collect();

            self.index.add(handle, &ids, &vectors, &metadatas, &texts)?;
            stored += batch.len();
            self.progress.index(stored as u64, total, &handle.name);
        }

        tracing::info!("Stored {} chunks in '{}'", stored, handle.name);
        Ok(stored)
    }

    /// The `k` records nearest to `query`, in index order.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<SearchResult>> {
        let handle = self.selected("search")?;
        let vector = self.embedder.embed(query).await?;
        let result = self.index.query(handle, &vector, k)?;

        let results: Vec<SearchResult> = result
            .texts
            .into_iter()
            .zip(result.metadatas)
            .zip(result.distances)
            .map(|((content, metadata), distance)| SearchResult {
                content,
                metadata,
                similarity: 1.0 - distance,
            })
            .collect();

        tracing::debug!("Search in '{}' returned {} results", handle.name, results.len());
        Ok(results)
    }

    fn selected(&self, action: &str) -> AppResult<&CollectionHandle> {
        self.collection.as_ref().ok_or_else(|| {
            AppError::Configuration(format!(
                "Cannot {}: no collection selected, call create_collection first",
                action
            ))
        })
    }

    fn check_embedding_space(&self, handle: &CollectionHandle) -> AppResult<()> {
        if handle.embedding_model != self.embedder.model_name()
            || handle.dimensions != self.embedder.dimensions()
        {
            return Err(AppError::Configuration(format!(
                "Collection '{}' was built with {} ({} dims) but the embedder is {} ({} dims); \
                 reindex the site to switch models",
                handle.name,
                handle.embedding_model,
                handle.dimensions,
                self.embedder.model_name(),
                self.embedder.dimensions()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("embedder", &self.embedder)
            .field("batch_size", &self.batch_size)
            .field("collection", &self.collection)
            .finish()
    }
}
