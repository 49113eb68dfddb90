//! WebRAG Core Library
//!
//! This crate provides the foundational utilities shared by every WebRAG crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (credentials, crawl, chunking and retrieval settings)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, CrawlSettings, EmbeddingSettings, GenerationSettings, RetrievalSettings};
pub use error::{AppError, AppResult};
