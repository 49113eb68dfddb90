//! Prompts that ship with the binary.
//!
//! A YAML file with the same id under `<data_dir>/prompts/` overrides these.

use crate::types::{PromptBehavior, PromptDefinition, PromptOutputSpec};

/// Identifier of the grounded question-answering prompt.
pub const RAG_ANSWER_PROMPT_ID: &str = "rag.answer";

/// Sentence the model is told to reply with when the context is insufficient.
pub const REFUSAL_SENTENCE: &str =
    "Based on the available information, I cannot provide a complete answer to that question.";

const RAG_ANSWER_TEMPLATE: &str = "You are an AI assistant that answers questions about website content.
Use ONLY the following context to answer the question.
If the information is in the context, provide a detailed and helpful answer.
If the question cannot be answered from the context, say \"Based on the available information, I cannot provide a complete answer to that question.\"
DO NOT make up or hallucinate any information not present in the context.

CONTEXT:
{{context}}

QUESTION: {{question}}

ANSWER:";

/// Look up a built-in prompt by id.
pub fn builtin_prompt(id: &str) -> Option<PromptDefinition> {
    match id {
        RAG_ANSWER_PROMPT_ID => Some(PromptDefinition {
            id: RAG_ANSWER_PROMPT_ID.to_string(),
            title: "Grounded website answer".to_string(),
            api_version: "1.0".to_string(),
            created_by: "webrag".to_string(),
            behavior: PromptBehavior {
                tone: "neutral".to_string(),
                style: "detailed".to_string(),
            },
            variables: vec!["context".to_string(), "question".to_string()],
            system: None,
            template: RAG_ANSWER_TEMPLATE.to_string(),
            output: PromptOutputSpec {
                format: "text".to_string(),
            },
        }),
        _ => None,
    }
}

/// Ids of every built-in prompt.
pub fn builtin_ids() -> &'static [&'static str] {
    &[RAG_ANSWER_PROMPT_ID]
}
