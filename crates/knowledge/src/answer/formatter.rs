//! Context block rendering for the answer prompt.

use crate::types::SearchResult;
use webrag_core::RetrievalSettings;

/// Context handed to the generator when nothing clears the threshold.
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found.";

/// Filters, ranks and renders search results into a prompt context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextFormatter {
    /// Results scoring below this are dropped
    pub similarity_threshold: f32,

    /// Maximum number of documents rendered
    pub top_k: usize,
}

impl Default for ContextFormatter {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            top_k: 8,
        }
    }
}

impl From<&RetrievalSettings> for ContextFormatter {
    fn from(settings: &RetrievalSettings) -> Self {
        Self {
            similarity_threshold: settings.similarity_threshold,
            top_k: settings.top_k,
        }
    }
}

impl ContextFormatter {
    pub fn new(similarity_threshold: f32, top_k: usize) -> Self {
        Self {
            similarity_threshold,
            top_k,
        }
    }

    /// Results that clear the threshold, best first, at most `top_k`.
    ///
    /// The sort is stable: equal similarities keep their input order.
    pub fn select<'a>(&self, results: &'a [SearchResult]) -> Vec<&'a SearchResult> {
        let mut kept: Vec<&SearchResult> = results
            .iter()
            .filter(|r| r.similarity >= self.similarity_threshold)
            .collect();

        kept.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        kept.truncate(self.top_k);
        kept
    }

    /// Render `results` as numbered document blocks.
    pub fn format_context(&self, results: &[SearchResult]) -> String {
        let selected = self.select(results);
        if selected.is_empty() {
            tracing::debug!(
                "No results at or above similarity {:.2}",
                self.similarity_threshold
            );
            return NO_RELEVANT_INFORMATION.to_string();
        }

        selected
            .iter()
            .enumerate()
            .map(|(i, r)| {
                format!(
                    "[Document {}] Title: {}\nSource: {}\nContent: {}\n",
                    i + 1,
                    r.metadata.title,
                    r.metadata.source_url,
                    r.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
