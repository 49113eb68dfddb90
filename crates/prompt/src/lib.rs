//! Prompt system for WebRAG.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - A built-in grounded answer prompt
//! - Per-data-directory overrides
//! - Handlebars template rendering

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::{builtin_prompt, RAG_ANSWER_PROMPT_ID, REFUSAL_SENTENCE};
pub use loader::{list_prompts, load_prompt, resolve_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptOutputSpec};
