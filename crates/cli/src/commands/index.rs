//! Index command handler.
//!
//! Crawls a website and stores its embedded chunks.

use super::{print_json, progress_reporter};
use clap::Args;
use std::time::Instant;
use webrag_core::{config::AppConfig, AppResult};
use webrag_knowledge::{build_pipeline, site_identifier};

/// Crawl a website and index its content
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Seed URL of the website
    pub url: String,

    /// Drop the site's existing collection and crawl it again
    #[arg(long)]
    pub reindex: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command for {}", self.url);
        let start = Instant::now();

        let mut pipeline = build_pipeline(config, progress_reporter(self.json))?;
        let stored = pipeline.initialize(&self.url, self.reindex).await?;
        let total = pipeline.store().collection_count()?;
        let site_id = site_identifier(&self.url)?;
        let duration = start.elapsed().as_secs_f64();

        if self.json {
            print_json(&serde_json::json!({
                "url": self.url,
                "collection": site_id,
                "chunksStored": stored,
                "totalRecords": total,
                "durationSecs": duration,
            }))?;
        } else if stored == 0 && total > 0 {
            println!(
                "'{}' is already indexed with {} records; use --reindex to crawl it again",
                site_id, total
            );
        } else {
            println!(
                "Indexed {} chunks into '{}' ({} records total) in {:.2}s",
                stored, site_id, total, duration
            );
        }

        Ok(())
    }
}
