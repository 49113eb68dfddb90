//! Core types for the website knowledge pipeline.

use serde::{Deserialize, Serialize};

/// Title used when a page has none.
pub const UNTITLED: &str = "Untitled";

/// Provenance carried by every chunk and every indexed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// Page the chunk was cut from
    pub source_url: String,

    /// Page title, or [`UNTITLED`]
    pub title: String,

    /// Position of the chunk within its page, dense from 0
    pub chunk_index: u32,

    /// 0 for the seed page, 1.. for discovered pages in discovery order
    pub page_index: u32,
}

/// A bounded slice of page text ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text, never empty
    pub content: String,

    /// Where the text came from
    pub metadata: ChunkMetadata,
}

/// A page as returned by a crawl service.
///
/// Services report missing fields as `None`; the crawler applies defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    /// Main page content rendered as Markdown
    pub markdown: Option<String>,

    /// Page title
    pub title: Option<String>,
}

impl FetchedPage {
    /// Create a page with both fields present.
    pub fn new(markdown: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            markdown: Some(markdown.into()),
            title: Some(title.into()),
        }
    }
}

/// One retrieved chunk with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Chunk text
    pub content: String,

    /// Chunk provenance
    pub metadata: ChunkMetadata,

    /// `1 - cosine distance`; may be negative
    pub similarity: f32,
}

/// Outcome of a question, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer or a user-facing failure message
    pub answer: String,

    /// Retrieved chunks, present only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<SearchResult>>,

    /// Whether an answer was produced
    pub success: bool,
}

impl Answer {
    /// A successful answer with the results it was grounded on.
    pub fn answered(answer: impl Into<String>, context: Vec<SearchResult>) -> Self {
        Self {
            answer: answer.into(),
            context: Some(context),
            success: true,
        }
    }

    /// A failure carrying a message for the user.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            answer: message.into(),
            context: None,
            success: false,
        }
    }
}
