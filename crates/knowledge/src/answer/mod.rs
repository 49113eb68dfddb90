//! Turning retrieved chunks into a grounded answer.

mod formatter;
mod generator;

pub use formatter::{ContextFormatter, NO_RELEVANT_INFORMATION};
pub use generator::AnswerGenerator;
pub use webrag_prompt::REFUSAL_SENTENCE;
