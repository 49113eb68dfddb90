//! Embedding generation for chunk text and queries.
//!
//! Providers are selected by name from [`EmbeddingConfig`]; the same provider
//! must embed both the stored chunks and the queries run against them.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
