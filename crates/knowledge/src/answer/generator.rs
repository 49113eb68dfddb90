//! Grounded answer generation through a completion provider.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use webrag_core::{AppError, AppResult, GenerationSettings};
use webrag_llm::{LlmClient, LlmRequest};
use webrag_prompt::{build_prompt, PromptDefinition};

/// Renders the answer prompt and asks the model to complete it.
pub struct AnswerGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    prompt: PromptDefinition,
}

impl AnswerGenerator {
    /// A generator using `prompt`, which must declare `context` and `question`.
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        prompt: PromptDefinition,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: 0.2,
            max_tokens: 1024,
            prompt,
        }
    }

    pub fn with_settings(mut self, settings: &GenerationSettings) -> Self {
        self.temperature = settings.temperature;
        self.max_tokens = settings.max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer `query` from `context`, returning the model's raw text.
    #[instrument(skip(self, context), fields(provider = self.client.provider_name(), model = %self.model))]
    pub async fn get_answer(&self, query: &str, context: &str) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("context".to_string(), context.to_string());
        variables.insert("question".to_string(), query.to_string());

        let built = build_prompt(&self.prompt, variables)?;

        let mut request = LlmRequest::new(built.user, &self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = self
            .client
            .complete(&request)
            .await
            .map_err(|e| match e {
                AppError::Generation(_) => e,
                other => AppError::Generation(other.to_string()),
            })?;

        if response.content.trim().is_empty() {
            return Err(AppError::Generation(format!(
                "{} returned an empty answer",
                self.client.provider_name()
            )));
        }

        tracing::debug!(
            "Generated answer ({} completion tokens)",
            response.usage.completion_tokens
        );
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{NO_RELEVANT_INFORMATION, REFUSAL_SENTENCE};
    use std::sync::Mutex;
    use webrag_llm::{LlmResponse, LlmUsage};
    use webrag_prompt::{builtin_prompt, RAG_ANSWER_PROMPT_ID};

    struct ScriptedClient {
        reply: AppResult<String>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedClient {
        fn new(reply: AppResult<String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedClient {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(content) => Ok(LlmResponse {
                    content: content.clone(),
                    model: request.model.clone(),
                    usage: LlmUsage::new(10, 5),
                    finish_reason: Some("stop".to_string()),
                }),
                Err(e) => Err(AppError::Llm(e.to_string())),
            }
        }
    }

    fn generator(client: Arc<ScriptedClient>) -> AnswerGenerator {
        AnswerGenerator::new(
            client,
            "llama3-8b-8192",
            builtin_prompt(RAG_ANSWER_PROMPT_ID).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_renders_prompt_and_returns_text() {
        let client = ScriptedClient::new(Ok("Plans start at $10.".to_string()));
        let answer = generator(client.clone())
            .get_answer("How much <is> it?", "[Document 1] Title: Pricing")
            .await
            .unwrap();
        assert_eq!(answer, "Plans start at $10.");

        let requests = client.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.model, "llama3-8b-8192");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(1024));
        assert!(request.prompt.contains("QUESTION: How much <is> it?"));
        assert!(request.prompt.contains("[Document 1] Title: Pricing"));
        assert!(request.prompt.contains(REFUSAL_SENTENCE));
        assert!(request.prompt.trim_end().ends_with("ANSWER:"));
    }

    #[tokio::test]
    async fn test_accepts_sentinel_context() {
        let client = ScriptedClient::new(Ok(REFUSAL_SENTENCE.to_string()));
        let answer = generator(client.clone())
            .get_answer("Who founded it?", NO_RELEVANT_INFORMATION)
            .await
            .unwrap();

        assert_eq!(answer, REFUSAL_SENTENCE);
        assert!(client.requests.lock().unwrap()[0]
            .prompt
            .contains(NO_RELEVANT_INFORMATION));
    }

    #[tokio::test]
    async fn test_provider_failure_is_generation_error() {
        let client = ScriptedClient::new(Err(AppError::Other("quota exceeded".to_string())));
        let err = generator(client).get_answer("q", "ctx").await.unwrap_err();

        assert!(matches!(err, AppError::Generation(_)));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_empty_answer_is_generation_error() {
        let client = ScriptedClient::new(Ok("   ".to_string()));
        let err = generator(client).get_answer("q", "ctx").await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }

    #[tokio::test]
    async fn test_uses_generation_settings() {
        let client = ScriptedClient::new(Ok("ok".to_string()));
        let settings = GenerationSettings {
            temperature: 0.7,
            max_tokens: 256,
            timeout_secs: 10,
        };

        generator(client.clone())
            .with_settings(&settings)
            .get_answer("q", "ctx")
            .await
            .unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].temperature, Some(0.7));
        assert_eq!(requests[0].max_tokens, Some(256));
    }
}
