//! Drop command handler.

use super::open_index;
use clap::Args;
use webrag_core::{config::AppConfig, AppResult};
use webrag_knowledge::{site_identifier, VectorIndex};

/// Delete a website's collection
#[derive(Args, Debug)]
pub struct DropCommand {
    /// URL of the website
    pub url: String,
}

impl DropCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing drop command for {}", self.url);

        let site_id = site_identifier(&self.url)?;
        if open_index(config)?.delete(&site_id)? {
            println!("Dropped collection '{}'", site_id);
        } else {
            println!("No collection '{}' to drop", site_id);
        }

        Ok(())
    }
}
