//! Prompts command handler.
//!
//! Lists prompt ids and whether each is overridden in the data directory.

use super::print_json;
use clap::Args;
use webrag_core::{config::AppConfig, AppResult};
use webrag_prompt::{list_prompts, resolve_prompt};

/// List available prompts
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let mut rows = Vec::new();
        for id in list_prompts(&config.data_dir)? {
            let prompt = resolve_prompt(&config.data_dir, &id)?;
            let overridden = config
                .data_dir
                .join("prompts")
                .join(format!("{}.yml", id))
                .exists();
            rows.push((prompt, overridden));
        }

        if self.json {
            let output: Vec<serde_json::Value> = rows
                .iter()
                .map(|(prompt, overridden)| {
                    serde_json::json!({
                        "id": prompt.id,
                        "title": prompt.title,
                        "variables": prompt.variables,
                        "overridden": overridden,
                    })
                })
                .collect();
            return print_json(&serde_json::Value::Array(output));
        }

        for (prompt, overridden) in &rows {
            let source = if *overridden { "override" } else { "built-in" };
            println!("{} - {} [{}]", prompt.id, prompt.title, source);
        }
        Ok(())
    }
}
