//! LLM integration crate for WebRAG.
//!
//! This crate provides a provider-agnostic abstraction for completion
//! services. Answer generation only depends on the [`LlmClient`] trait.
//!
//! # Providers
//! - **Groq / OpenAI**: hosted chat-completions APIs (`ChatCompletionsClient`)
//! - **Ollama**: local LLM runtime (`OllamaClient`)
//!
//! # Example
//! ```no_run
//! use webrag_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{ChatCompletionsClient, OllamaClient};
pub use types::ProviderType;
