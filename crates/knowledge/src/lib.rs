//! Website question answering over a local vector index.
//!
//! A site is crawled from a seed URL, split into overlapping chunks, embedded
//! and stored in a per-site collection. Questions are answered by retrieving
//! the nearest chunks and asking a completion model to answer from them only.

pub mod answer;
pub mod chunker;
pub mod crawler;
pub mod embeddings;
pub mod factory;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use answer::{AnswerGenerator, ContextFormatter, NO_RELEVANT_INFORMATION, REFUSAL_SENTENCE};
pub use chunker::Chunker;
pub use crawler::{CrawlOptions, CrawlService, WebsiteCrawler};
pub use factory::{build_pipeline, create_crawl_service, provider_credentials};
pub use pipeline::{site_identifier, PipelineState, RagPipeline, NOT_INITIALIZED_MESSAGE};
pub use progress::{Phase, ProgressCallback, ProgressEvent, ProgressReporter};
pub use registry::{PipelineRegistry, ProviderCredentials, SharedPipeline};
pub use store::{SqliteIndex, VectorIndex, VectorStore};
pub use types::{Answer, Chunk, ChunkMetadata, FetchedPage, SearchResult};
