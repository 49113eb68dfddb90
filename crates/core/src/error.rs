//! Error types for WebRAG.
//!
//! This module defines a unified error enum that covers every failure kind
//! of the pipeline: invalid settings, call-order violations, crawl failures,
//! completion failures, and the usual I/O and serialization errors.

use thiserror::Error;

/// Unified error type for WebRAG.
///
/// All functions in the workspace return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or missing settings (bad config file, unknown provider, missing key)
    #[error("Configuration error: {0}")]
    Config(String),

    /// An operation was invoked before its required setup step
    /// (e.g. search before a collection was selected). Not retryable.
    #[error("Call-order error: {0}")]
    Configuration(String),

    /// A page (seed or discovered) failed to download or render
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Site mapping / URL discovery failed
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// The completion service failed or returned unusable output
    #[error("Generation error: {0}")]
    Generation(String),

    /// LLM provider transport errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Vector index and embedding errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether retrying the same operation can reasonably succeed.
    ///
    /// Call-order and settings errors need a code or config fix instead.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Fetch(_)
                | AppError::Discovery(_)
                | AppError::Generation(_)
                | AppError::Llm(_)
                | AppError::Io(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
