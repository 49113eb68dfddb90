//! LLM provider factory.
//!
//! Builds a completion client from the configured provider name, endpoint
//! and credentials.

use crate::client::LlmClient;
use crate::providers::{ChatCompletionsClient, OllamaClient};
use crate::types::ProviderType;
use std::sync::Arc;
use std::time::Duration;
use webrag_core::{AppError, AppResult};

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("groq", "openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required by hosted providers)
/// * `timeout` - Per-request timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown, a required key
/// is missing, or the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    let base_url = endpoint.unwrap_or(provider_type.default_endpoint());

    match provider_type {
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::with_timeout(base_url, timeout)?)),
        ProviderType::Groq | ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config(format!(
                    "{} provider requires API key",
                    provider_type.as_str()
                ))
            })?;
            let client =
                ChatCompletionsClient::new(provider_type.as_str(), base_url, api_key, timeout)?;
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None, TIMEOUT).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_groq_client() {
        let client = create_client("groq", None, Some("gsk-test"), TIMEOUT).unwrap();
        assert_eq!(client.provider_name(), "groq");
    }

    #[test]
    fn test_groq_requires_api_key() {
        match create_client("groq", None, None, TIMEOUT) {
            Err(err) => assert!(err.to_string().contains("groq provider requires API key")),
            Ok(_) => panic!("Expected error for Groq without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None, TIMEOUT) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
