//! Page text chunking with configurable size and overlap.
//!
//! Splitting is recursive and boundary-aware (paragraphs, then lines,
//! sentences, words, graphemes) via the `text-splitter` crate. Sizes are
//! counted in characters.

use crate::types::{Chunk, ChunkMetadata};
use text_splitter::{ChunkConfig, TextSplitter};
use webrag_core::{AppError, AppResult};

/// A piece of page text with its byte offset in the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice<'a> {
    /// Byte offset of `text` within the page
    pub offset: usize,

    /// The slice itself
    pub text: &'a str,
}

/// Splits page text into overlapping chunks.
pub struct Chunker {
    splitter: TextSplitter<text_splitter::Characters>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Create a chunker; `chunk_overlap` must be smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Config("Chunk size must be positive".to_string()));
        }

        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| {
                AppError::Config(format!(
                    "Invalid chunk overlap {} for size {}: {}",
                    chunk_overlap, chunk_size, e
                ))
            })?;

        Ok(Self {
            splitter: TextSplitter::new(config),
            chunk_size,
            chunk_overlap,
        })
    }

    /// Maximum chunk length in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Maximum characters shared by consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into slices, skipping whitespace-only pieces.
    pub fn split<'a>(&self, text: &'a str) -> Vec<PageSlice<'a>> {
        self.splitter
            .chunk_indices(text)
            .filter(|(_, piece)| !piece.trim().is_empty())
            .map(|(offset, piece)| PageSlice {
                offset,
                text: piece,
            })
            .collect()
    }

    /// Chunk one page. Chunks never cross pages; `chunk_index` starts at 0.
    pub fn chunk_page(
        &self,
        source_url: &str,
        title: &str,
        page_index: u32,
        text: &str,
    ) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self
            .split(text)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, slice)| Chunk {
                content: slice.text.to_string(),
                metadata: ChunkMetadata {
                    source_url: source_url.to_string(),
                    title: title.to_string(),
                    chunk_index: chunk_index as u32,
                    page_index,
                },
            })
            .collect();

        tracing::debug!(
            source_url,
            chunks = chunks.len(),
            chunk_size = self.chunk_size,
            overlap = self.chunk_overlap,
            "Chunked page"
        );

        chunks
    }
}
