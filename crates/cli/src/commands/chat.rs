//! Chat command handler.
//!
//! Reads questions from stdin until EOF or `exit`. The pipeline comes from
//! the process-wide registry so repeated sessions reuse it.

use super::{print_answer, progress_reporter, ready_pipeline};
use clap::Args;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use webrag_core::{config::AppConfig, AppResult};
use webrag_knowledge::{build_pipeline, provider_credentials, ContextFormatter, PipelineRegistry};

/// Ask questions interactively
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// URL of the website
    pub url: String,

    /// Drop and re-crawl the site before chatting
    #[arg(long)]
    pub reindex: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command for {}", self.url);

        let registry = PipelineRegistry::global();
        let shared = registry
            .get_or_try_init(&provider_credentials(config), move || async move {
                build_pipeline(config, progress_reporter(false))
            })
            .await?;

        let mut pipeline = shared.lock().await;
        let records = if self.reindex {
            pipeline.initialize(&self.url, true).await?
        } else {
            ready_pipeline(&mut pipeline, &self.url).await?
        };
        eprintln!(
            "Ready: {} records from {}. Type 'exit' or press Ctrl-D to quit.",
            records, self.url
        );

        let formatter = ContextFormatter::from(&config.retrieval);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                println!();
                break;
            };

            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
                break;
            }

            let answer = pipeline.answer_question(question).await;
            if answer.success {
                print_answer(&answer, &formatter);
            } else {
                eprintln!("{}", answer.answer);
            }
            println!();
        }

        drop(pipeline);
        registry.clear().await;
        Ok(())
    }
}
