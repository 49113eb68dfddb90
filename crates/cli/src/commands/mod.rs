//! Command handlers for the WebRAG CLI.
//!
//! Each command lives in its own submodule; shared pipeline setup and
//! output helpers live here.

pub mod ask;
pub mod chat;
pub mod drop;
pub mod index;
pub mod prompts;
pub mod stats;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use drop::DropCommand;
pub use index::IndexCommand;
pub use prompts::PromptsCommand;
pub use stats::StatsCommand;

use std::sync::Arc;
use webrag_core::{config::AppConfig, AppError, AppResult};
use webrag_knowledge::{Answer, ContextFormatter, ProgressReporter, RagPipeline, SqliteIndex};

/// Progress lines on stderr, or nothing when stdout carries JSON.
pub fn progress_reporter(quiet: bool) -> ProgressReporter {
    if quiet {
        return ProgressReporter::noop();
    }
    ProgressReporter::new(Arc::new(|event| {
        eprintln!("{}", event.format_simple());
    }))
}

/// Make `pipeline` ready for `url`, reusing an existing index when there is one.
///
/// Returns the number of records the site has.
pub async fn ready_pipeline(pipeline: &mut RagPipeline, url: &str) -> AppResult<usize> {
    match pipeline.resume(url) {
        Ok(count) => Ok(count),
        Err(AppError::Configuration(reason)) => {
            tracing::info!("{}; crawling {}", reason, url);
            pipeline.initialize(url, false).await
        }
        Err(e) => Err(e),
    }
}

/// Open the index without building any network client.
pub fn open_index(config: &AppConfig) -> AppResult<SqliteIndex> {
    let path = config.index_path();
    if !path.exists() {
        return Err(AppError::Config(format!(
            "No index at {:?}; run 'webrag index <url>' first",
            path
        )));
    }
    SqliteIndex::open(&path)
}

/// Characters of chunk text shown under each source.
const PREVIEW_CHARS: usize = 120;

/// Source lines for the results that reached the answer context: one per
/// page, best score first, each with its relevance and a content preview.
pub fn source_lines(answer: &Answer, formatter: &ContextFormatter) -> Vec<String> {
    let Some(context) = &answer.context else {
        return Vec::new();
    };

    let mut seen: Vec<&str> = Vec::new();
    let mut lines = Vec::new();
    for result in formatter.select(context) {
        let url = result.metadata.source_url.as_str();
        if seen.contains(&url) {
            continue;
        }
        seen.push(url);

        lines.push(format!(
            "{}. {} ({}) relevance {:.2}",
            seen.len(),
            result.metadata.title,
            url,
            result.similarity
        ));
        lines.push(format!("   {}", preview(&result.content)));
    }
    lines
}

fn preview(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Print an answer followed by the sources it was drawn from.
pub fn print_answer(answer: &Answer, formatter: &ContextFormatter) {
    println!("{}", answer.answer);

    let lines = source_lines(answer, formatter);
    if lines.is_empty() {
        return;
    }

    println!();
    println!("Sources:");
    for line in lines {
        println!("{}", line);
    }
}

/// Pretty-print JSON on stdout.
pub fn print_json(value: &serde_json::Value) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use webrag_knowledge::{ChunkMetadata, SearchResult};

    #[test]
    fn test_open_index_requires_existing_file() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_with(Some(dir.path()), None).unwrap();

        let err = open_index(&config).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));

        SqliteIndex::open(&config.index_path()).unwrap();
        assert!(open_index(&config).is_ok());
    }

    fn result(url: &str, title: &str, content: &str, similarity: f32) -> SearchResult {
        SearchResult {
            content: content.to_string(),
            metadata: ChunkMetadata {
                source_url: url.to_string(),
                title: title.to_string(),
                chunk_index: 0,
                page_index: 0,
            },
            similarity,
        }
    }

    #[test]
    fn test_source_lines_only_list_context_documents() {
        let answer = Answer::answered(
            "Ten dollars.",
            vec![
                result("https://a.io/blog", "Blog", "Weekly updates.", 0.3),
                result("https://a.io/", "Home", "Pricing is $10.", 0.9),
                result("https://a.io/", "Home", "Plans renew monthly.", 0.8),
                result("https://a.io/about", "About", "Our team is small.", 0.6),
            ],
        );

        let lines = source_lines(&answer, &ContextFormatter::new(0.5, 8));
        assert_eq!(
            lines,
            vec![
                "1. Home (https://a.io/) relevance 0.90",
                "   Pricing is $10.",
                "2. About (https://a.io/about) relevance 0.60",
                "   Our team is small.",
            ]
        );

        print_answer(&answer, &ContextFormatter::default());
    }

    #[test]
    fn test_source_lines_for_failed_answer() {
        let answer = Answer::failed("An error occurred: boom");
        assert!(source_lines(&answer, &ContextFormatter::default()).is_empty());
        print_answer(&answer, &ContextFormatter::default());
    }

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("Pricing\n\nis   $10."), "Pricing is $10.");

        let long = "word ".repeat(60);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert!(shown.chars().count() <= PREVIEW_CHARS + 3);
    }
}
