//! Stats command handler.
//!
//! Reads collection details straight from the index.

use super::{open_index, print_json};
use clap::Args;
use webrag_core::{config::AppConfig, AppError, AppResult};
use webrag_knowledge::{site_identifier, VectorIndex};

/// Show indexed collections
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Only show the collection for this website
    pub url: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let index = open_index(config)?;
        let collections = match &self.url {
            Some(url) => {
                let site_id = site_identifier(url)?;
                let handle = index.get(&site_id)?.ok_or_else(|| {
                    AppError::Config(format!("{} has not been indexed", url))
                })?;
                vec![handle]
            }
            None => index.list()?,
        };

        let mut rows = Vec::with_capacity(collections.len());
        for handle in collections {
            let records = index.count(&handle)?;
            rows.push((handle, records));
        }

        if self.json {
            let output: Vec<serde_json::Value> = rows
                .iter()
                .map(|(handle, records)| {
                    serde_json::json!({
                        "id": handle.id,
                        "collection": handle.name,
                        "metric": handle.metric.as_str(),
                        "dimensions": handle.dimensions,
                        "embeddingModel": handle.embedding_model,
                        "createdAt": handle.created_at,
                        "records": records,
                    })
                })
                .collect();
            return print_json(&serde_json::Value::Array(output));
        }

        if rows.is_empty() {
            println!("No websites indexed in {:?}", config.index_path());
            return Ok(());
        }

        for (handle, records) in &rows {
            println!("Collection: {} (id {})", handle.name, handle.id);
            println!("  Records: {}", records);
            println!(
                "  Embeddings: {} ({} dims, {})",
                handle.embedding_model,
                handle.dimensions,
                handle.metric.as_str()
            );
            println!("  Created: {}", handle.created_at);
        }

        Ok(())
    }
}
